//! # warden-provider-http
//!
//! REST implementation of the provider traits in `warden-provider`.
//!
//! Talks to the remote identity service's endpoints with `reqwest`.
//! Administrative calls authenticate with a service key; session-scoped
//! calls forward the operator's bearer token. Every method is a single
//! request/response exchange with no retry, timeout, or backoff logic.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

mod client;
mod wire;

pub use client::HttpProvider;
