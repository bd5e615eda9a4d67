//! Console state management.

use std::sync::Arc;

use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;

use crate::events::AuditLogger;

/// Shared state of the console API.
///
/// Holds the provider seams and the audit sink behind `Arc`s so the
/// routers can be cloned per request.
pub struct ConsoleState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    /// Administrative directory operations.
    pub directory: Arc<D>,
    /// Session-scoped account operations.
    pub accounts: Arc<A>,
    /// Audit event sink.
    pub audit: Arc<L>,
}

// Manual Clone implementation that doesn't require T: Clone for Arc<T>
impl<D, A, L> Clone for ConsoleState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            accounts: Arc::clone(&self.accounts),
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<D, A, L> ConsoleState<D, A, L>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    /// Creates a console state from its parts.
    pub fn new(directory: Arc<D>, accounts: Arc<A>, audit: Arc<L>) -> Self {
        Self {
            directory,
            accounts,
            audit,
        }
    }
}
