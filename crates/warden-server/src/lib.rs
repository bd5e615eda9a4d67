//! # warden-server
//!
//! The Warden admin console server: configuration, provider wiring,
//! router composition, and the HTML pages.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod router;
pub mod state;
pub mod ui;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;
