//! Administrative directory operations.

use async_trait::async_trait;
use warden_model::{OperatorSession, Page, UserRecord};

use crate::error::ProviderResult;
use crate::query::UserQuery;

/// Payload for creating an account on an operator's behalf.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Initial password (hashed remotely).
    pub password: String,
    /// Initial role, when assigned at creation.
    pub role: Option<String>,
}

impl NewUser {
    /// Creates a payload with the required fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    /// Sets the initial role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Administrative operations against the remote identity service.
///
/// Each method is a single request/response call; implementations must
/// not retry. Calls are authenticated with service credentials except
/// for the impersonation pair, which acts on an operator session.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Lists users matching the query, with listing metadata.
    async fn list_users(&self, query: &UserQuery) -> ProviderResult<Page<UserRecord>>;

    /// Creates a user.
    ///
    /// ## Errors
    ///
    /// Returns an API error when the email is already registered.
    async fn create_user(&self, user: &NewUser) -> ProviderResult<UserRecord>;

    /// Replaces the user's role assignment.
    async fn set_role(&self, user_id: &str, role: &str) -> ProviderResult<UserRecord>;

    /// Forces a new password for the user.
    async fn set_password(&self, user_id: &str, new_password: &str) -> ProviderResult<()>;

    /// Bans the user, revoking their sessions.
    ///
    /// `expires_in` is in seconds; a ban without it stays in place until
    /// the user is unbanned.
    async fn ban_user(
        &self,
        user_id: &str,
        reason: Option<&str>,
        expires_in: Option<i64>,
    ) -> ProviderResult<UserRecord>;

    /// Lifts a ban.
    async fn unban_user(&self, user_id: &str) -> ProviderResult<UserRecord>;

    /// Revokes every session of the user.
    async fn revoke_sessions(&self, user_id: &str) -> ProviderResult<()>;

    /// Starts acting as the user. The minted session names the operator
    /// in `impersonated_by`.
    async fn impersonate(
        &self,
        operator_token: &str,
        user_id: &str,
    ) -> ProviderResult<OperatorSession>;

    /// Ends impersonation, restoring the operator's own session.
    async fn stop_impersonating(&self, token: &str) -> ProviderResult<OperatorSession>;

    /// Removes the account.
    async fn remove_user(&self, user_id: &str) -> ProviderResult<()>;
}
