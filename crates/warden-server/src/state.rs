//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use warden_console::events::AuditLogger;
use warden_console::ConsoleState;
use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
pub struct AppState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    /// Server configuration.
    pub config: ServerConfig,

    /// Console state holding the provider seams and the audit sink.
    pub console: ConsoleState<D, A, L>,
}

impl<D, A, L> Clone for AppState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            console: self.console.clone(),
        }
    }
}

impl<D, A, L> AppState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    /// Creates a new application state.
    pub fn new(config: ServerConfig, console: ConsoleState<D, A, L>) -> Self {
        Self { config, console }
    }
}
