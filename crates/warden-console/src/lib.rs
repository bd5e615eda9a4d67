//! # warden-console
//!
//! Console HTTP API for the Warden admin directory.
//!
//! This crate provides the request handling between operators and the
//! remote identity service: input validation, operator authentication,
//! action dispatch, audit logging, and the uniform error contract. It
//! is generic over the provider seams in `warden-provider`, so the
//! server wires it to the REST provider and tests wire it to the
//! in-memory one.
//!
//! ## Modules
//!
//! - [`auth`] - Operator authentication middleware and extractor
//! - [`dto`] - Request/response DTOs with validation
//! - [`error`] - Error types and HTTP error responses
//! - [`events`] - Audit event logging
//! - [`router`] - Axum routers and HTTP handlers
//! - [`state`] - Shared console state
//! - [`status`] - Transient per-field save status
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_console::{account_router, auth_middleware, directory_router, ConsoleState};
//!
//! let state = ConsoleState::new(provider.clone(), provider, Arc::new(audit));
//! let app = directory_router()
//!     .layer(axum::middleware::from_fn(warden_console::require_admin))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
//!     .with_state(state);
//! ```
//!
//! ## API Endpoints
//!
//! ### Directory (admin role required)
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/console/users` | List/search users |
//! | POST | `/console/users` | Create a user |
//! | PUT | `/console/users/{id}/role` | Replace the role assignment |
//! | PUT | `/console/users/{id}/password` | Force a new password |
//! | POST | `/console/users/{id}/ban` | Ban a user |
//! | DELETE | `/console/users/{id}/ban` | Lift a ban |
//! | DELETE | `/console/users/{id}/sessions` | Revoke all sessions |
//! | POST | `/console/users/{id}/impersonate` | Start impersonation |
//! | DELETE | `/console/users/{id}` | Remove an account |
//!
//! ### Account (session required, no admin role)
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/account/sign-up` | Self-service registration |
//! | POST | `/account/sign-in` | Authenticate |
//! | POST | `/account/sign-out` | Invalidate the current session |
//! | GET | `/account` | Current operator profile |
//! | PATCH | `/account/profile` | Update name and/or avatar |
//! | POST | `/account/password` | Change the password |
//! | POST | `/console/impersonation/stop` | End impersonation |

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod auth;
pub mod dto;
pub mod error;
pub mod events;
pub mod router;
pub mod state;
pub mod status;

// Re-export commonly used types
pub use auth::{
    auth_middleware, extract_session_token, require_admin, OperatorAuth, ADMIN_REQUIRED,
    SESSION_COOKIE,
};
pub use dto::{
    AccountResponse, BanUserRequest, ChangePasswordRequest, CreateUserRequest, DirectoryPage,
    DirectoryQuery, RoleName, SetPasswordRequest, SetRoleRequest, SignInRequest, SignUpRequest,
    UpdateProfileRequest,
};
pub use error::{ConsoleError, ConsoleResult, ErrorResponse};
pub use events::{
    AuditError, AuditEvent, AuditEventBuilder, AuditEventType, AuditLogger, AuditOutcome,
    InMemoryAuditLogger, TracingAuditLogger,
};
pub use router::{account_public_router, account_router, directory_router};
pub use state::ConsoleState;
pub use status::{SaveStatus, StatusBoard, STATUS_RESET_DELAY_MS};
