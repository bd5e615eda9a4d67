//! # warden-provider
//!
//! Trait seams for the remote identity service.
//!
//! The service owns every hard operation (credential hashing, session
//! issuance, ban enforcement, impersonation tokens); these traits
//! describe the calls Warden makes against it. [`HttpProvider`] in
//! `warden-provider-http` implements them over REST;
//! [`memory::InMemoryProvider`] implements them in-process for tests
//! and local development.
//!
//! ## Modules
//!
//! - [`account`] - Session-scoped self-service operations
//! - [`directory`] - Administrative directory operations
//! - [`error`] - Provider error contract
//! - [`memory`] - In-memory provider
//! - [`query`] - Directory search criteria
//!
//! [`HttpProvider`]: https://docs.rs/warden-provider-http

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod account;
pub mod directory;
pub mod error;
pub mod memory;
pub mod query;

pub use account::{AccountProvider, ProfileUpdate, SignUp};
pub use directory::{DirectoryProvider, NewUser};
pub use error::{ProviderError, ProviderResult, GENERIC_FAILURE};
pub use memory::InMemoryProvider;
pub use query::{SearchField, SortDirection, SortField, UserQuery, DEFAULT_LIMIT};
