//! Session-scoped self-service operations.

use async_trait::async_trait;
use warden_model::{OperatorSession, UserRecord};

use crate::error::ProviderResult;

/// Payload for self-service registration.
#[derive(Debug, Clone)]
pub struct SignUp {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password (hashed remotely).
    pub password: String,
    /// Avatar URL or data URI.
    pub image: Option<String>,
}

impl SignUp {
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
            image: None,
        }
    }

    /// Sets the avatar.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Partial profile update.
///
/// Fields left `None` are untouched. The avatar distinguishes "leave as
/// is" (`None`) from "clear it" (`Some(None)`), matching the explicit
/// null the wire format uses.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New avatar, or `Some(None)` to clear it.
    pub image: Option<Option<String>>,
}

impl ProfileUpdate {
    /// An update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets or clears the avatar.
    #[must_use]
    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = Some(image);
        self
    }

    /// Whether the update carries any change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none()
    }
}

/// Self-service operations acting on a session token.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Registers an account and signs it in.
    async fn sign_up(&self, signup: &SignUp) -> ProviderResult<OperatorSession>;

    /// Authenticates with email and password.
    ///
    /// ## Errors
    ///
    /// Returns an API error on bad credentials or a banned account.
    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<OperatorSession>;

    /// Invalidates the session.
    async fn sign_out(&self, token: &str) -> ProviderResult<()>;

    /// Resolves a session token to the account it authenticates, or
    /// `None` when the token is unknown or expired.
    async fn get_session(&self, token: &str) -> ProviderResult<Option<OperatorSession>>;

    /// Applies a partial profile update to the session's account.
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> ProviderResult<UserRecord>;

    /// Changes the account password after verifying the current one.
    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> ProviderResult<()>;
}
