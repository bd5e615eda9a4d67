//! Request and response DTOs for the console API.
//!
//! Requests validate themselves before any provider call is made;
//! validation failures carry the exact strings the console shows.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use warden_model::{Page, UserRecord};
use warden_provider::account::{ProfileUpdate, SignUp};
use warden_provider::directory::NewUser;
use warden_provider::{SearchField, SortDirection, SortField, UserQuery};

use crate::error::{ConsoleError, ConsoleResult};

/// Roles assignable through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    /// Regular account.
    #[default]
    User,
    /// Directory administrator.
    Admin,
}

impl RoleName {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Query parameters of the directory listing.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryQuery {
    /// Free-text search value.
    pub search_value: Option<String>,
    /// Field the search runs against.
    pub search_field: Option<SearchField>,
    /// Sort key.
    pub sort_by: Option<SortField>,
    /// Sort direction.
    pub sort_direction: Option<SortDirection>,
    /// Page size.
    pub limit: Option<usize>,
    /// Offset of the first record.
    pub offset: Option<usize>,
    /// Equality filter on the banned flag.
    pub banned: Option<bool>,
}

impl DirectoryQuery {
    /// Converts to provider search criteria, applying the defaults.
    #[must_use]
    pub fn into_query(self) -> UserQuery {
        let mut query = UserQuery::new();
        if let Some(value) = self.search_value {
            query = query.search(value);
        }
        if let Some(field) = self.search_field {
            query = query.search_field(field);
        }
        query = query.sort(
            self.sort_by.unwrap_or_default(),
            self.sort_direction.unwrap_or_default(),
        );
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(banned) = self.banned {
            query = query.banned(banned);
        }
        query
    }
}

/// Directory listing response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryPage {
    /// Users on this page.
    pub users: Vec<UserRecord>,
    /// Total number of matching records.
    pub total: usize,
    /// Page size.
    pub limit: usize,
    /// Offset of the first record.
    pub offset: usize,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
}

impl From<Page<UserRecord>> for DirectoryPage {
    fn from(page: Page<UserRecord>) -> Self {
        Self {
            has_next: page.has_next(),
            has_previous: page.has_previous(),
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            users: page.items,
        }
    }
}

/// The signed-in operator's own account view.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// The operator's account.
    pub user: UserRecord,
    /// Set while the operator is impersonating another account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<String>,
}

/// Request to create a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Initial password.
    #[serde(default)]
    pub password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
    /// Initial role.
    #[serde(default)]
    pub role: RoleName,
}

impl CreateUserRequest {
    /// Validates the request and shapes the provider payload.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when a required field is missing or
    /// the confirmation does not match.
    pub fn into_new_user(self) -> ConsoleResult<NewUser> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(ConsoleError::validation(
                "Name, email, and password are required.",
            ));
        }
        if self.password != self.confirm_password {
            return Err(ConsoleError::validation("Passwords do not match."));
        }
        Ok(NewUser::new(name, email, self.password).with_role(self.role.as_str()))
    }
}

/// Request to replace a user's role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetRoleRequest {
    /// The role to assign.
    pub role: Option<RoleName>,
}

impl SetRoleRequest {
    /// Validates the request.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when no role was selected.
    pub fn role(self) -> ConsoleResult<RoleName> {
        self.role
            .ok_or_else(|| ConsoleError::validation("Select a role."))
    }
}

/// Request to force a user's password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    /// New password.
    #[serde(default)]
    pub new_password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
}

impl SetPasswordRequest {
    /// Validates the request and returns the trimmed password.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when the password is blank or the
    /// confirmation does not match.
    pub fn into_password(self) -> ConsoleResult<String> {
        let trimmed = self.new_password.trim();
        if trimmed.is_empty() {
            return Err(ConsoleError::validation("New password is required."));
        }
        if self.new_password != self.confirm_password {
            return Err(ConsoleError::validation("Passwords do not match."));
        }
        Ok(trimmed.to_string())
    }
}

/// Request to ban a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanUserRequest {
    /// Reason shown to the user; blank input is dropped.
    pub ban_reason: Option<String>,
    /// Ban duration in seconds; absent bans are permanent.
    pub ban_expires_in: Option<i64>,
}

impl BanUserRequest {
    /// Validates the request, returning the trimmed reason and expiry.
    ///
    /// ## Errors
    ///
    /// Returns a validation error for a non-positive duration.
    pub fn into_parts(self) -> ConsoleResult<(Option<String>, Option<i64>)> {
        if let Some(expires_in) = self.ban_expires_in {
            if expires_in <= 0 {
                return Err(ConsoleError::validation("Ban duration must be positive."));
            }
        }
        let reason = self
            .ban_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok((reason, self.ban_expires_in))
    }
}

/// Request for self-service registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
    /// Avatar URL or data URI.
    pub image: Option<String>,
}

impl SignUpRequest {
    /// Validates the request and shapes the provider payload.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when a required field is missing or
    /// the confirmation does not match.
    pub fn into_sign_up(self) -> ConsoleResult<SignUp> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(ConsoleError::validation(
                "Name, email, and password are required.",
            ));
        }
        if self.password != self.confirm_password {
            return Err(ConsoleError::validation("Passwords do not match."));
        }
        let mut signup = SignUp::new(name, email, self.password);
        if let Some(image) = self.image.filter(|i| !i.is_empty()) {
            signup = signup.with_image(image);
        }
        Ok(signup)
    }
}

/// Request to sign in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

impl SignInRequest {
    /// Validates the request.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when either field is blank.
    pub fn into_credentials(self) -> ConsoleResult<(String, String)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(ConsoleError::validation("Email and password are required."));
        }
        Ok((email.to_string(), self.password))
    }
}

fn nullable_image<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    // A present field deserializes to Some(inner), so an explicit null
    // reads as "clear the avatar" while an absent field leaves it.
    Ok(Some(Option::<String>::deserialize(deserializer)?))
}

/// Request to update the operator's own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub name: Option<String>,
    /// New avatar; an explicit null clears it.
    #[serde(
        default,
        deserialize_with = "nullable_image",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<String>>,
}

impl UpdateProfileRequest {
    /// Validates the request and shapes the provider payload.
    ///
    /// ## Errors
    ///
    /// Returns a validation error for a blank name or an update that
    /// changes nothing.
    pub fn into_update(self) -> ConsoleResult<ProfileUpdate> {
        let mut update = ProfileUpdate::new();
        if let Some(name) = self.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ConsoleError::validation("Name cannot be empty."));
            }
            update = update.name(trimmed);
        }
        if let Some(image) = self.image {
            update = update.image(image.filter(|i| !i.is_empty()));
        }
        if update.is_empty() {
            return Err(ConsoleError::validation("Nothing to update."));
        }
        Ok(update)
    }
}

/// Request to change the operator's own password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    #[serde(default)]
    pub current_password: String,
    /// New password.
    #[serde(default)]
    pub new_password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
    /// Whether to revoke every other session of the account.
    #[serde(default)]
    pub revoke_other_sessions: bool,
}

impl ChangePasswordRequest {
    /// Validates the request.
    ///
    /// ## Errors
    ///
    /// Returns a validation error when a field is blank or the
    /// confirmation does not match.
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ConsoleError::validation("Fill out all password fields."));
        }
        if self.new_password != self.confirm_password {
            return Err(ConsoleError::validation("Passwords do not match."));
        }
        Ok(())
    }
}
