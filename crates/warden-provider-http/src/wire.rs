//! Wire payloads for the remote identity service.
//!
//! Field names follow the service's camelCase convention. Responses are
//! tolerant: absent listing metadata defaults to zero and unknown
//! fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use warden_model::{OperatorSession, Page, SessionHandle, UserRecord};

use warden_provider::{ProviderError, ProviderResult};

/// Error body the service attaches to non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
}

/// Response of the list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    /// Matching users.
    #[serde(default)]
    pub users: Vec<UserRecord>,
    /// Total number of matching records.
    #[serde(default)]
    pub total: usize,
    /// Page size the listing was produced with.
    pub limit: Option<usize>,
    /// Offset of the first record.
    pub offset: Option<usize>,
}

impl ListUsersResponse {
    /// Converts to a page, falling back to the requested window when
    /// the service omitted it.
    #[must_use]
    pub fn into_page(self, requested_limit: usize, requested_offset: usize) -> Page<UserRecord> {
        Page::new(
            self.users,
            self.total,
            self.limit.unwrap_or(requested_limit),
            self.offset.unwrap_or(requested_offset),
        )
    }
}

/// A single user wrapped in the service's response envelope.
#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    /// The affected user.
    pub user: UserRecord,
}

/// Session fields as the service reports them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Bearer token.
    pub token: String,
    /// Session expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Operator acting through this session, for impersonation
    /// sessions.
    pub impersonated_by: Option<String>,
}

impl From<SessionPayload> for SessionHandle {
    fn from(payload: SessionPayload) -> Self {
        let mut handle = Self::new(payload.token);
        if let Some(at) = payload.expires_at {
            handle = handle.with_expires_at(at);
        }
        if let Some(operator_id) = payload.impersonated_by {
            handle = handle.with_impersonated_by(operator_id);
        }
        handle
    }
}

/// Session plus the account it authenticates.
#[derive(Debug, Deserialize)]
pub struct SessionEnvelope {
    /// The session.
    pub session: SessionPayload,
    /// The account.
    pub user: UserRecord,
}

impl From<SessionEnvelope> for OperatorSession {
    fn from(envelope: SessionEnvelope) -> Self {
        Self::new(envelope.user, envelope.session.into())
    }
}

/// Response of the sign-in and sign-up endpoints, which report the
/// token at the top level.
#[derive(Debug, Deserialize)]
pub struct TokenEnvelope {
    /// Bearer token.
    pub token: Option<String>,
    /// The signed-in account.
    pub user: UserRecord,
}

impl TokenEnvelope {
    /// Converts to an operator session.
    ///
    /// ## Errors
    ///
    /// Returns a decode error when the service omitted the token.
    pub fn into_session(self) -> ProviderResult<OperatorSession> {
        let token = self
            .token
            .ok_or_else(|| ProviderError::Decode("response carried no session token".to_string()))?;
        Ok(OperatorSession::new(self.user, SessionHandle::new(token)))
    }
}

// ---------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------

/// Body of the create-user call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody<'a> {
    /// Display name.
    pub name: &'a str,
    /// Email address.
    pub email: &'a str,
    /// Initial password.
    pub password: &'a str,
    /// Initial role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
}

/// Body of calls addressing a single user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdBody<'a> {
    /// Target user.
    pub user_id: &'a str,
}

/// Body of the set-role call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleBody<'a> {
    /// Target user.
    pub user_id: &'a str,
    /// New role assignment.
    pub role: &'a str,
}

/// Body of the set-password call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordBody<'a> {
    /// Target user.
    pub user_id: &'a str,
    /// Password to force.
    pub new_password: &'a str,
}

/// Body of the ban call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanBody<'a> {
    /// Target user.
    pub user_id: &'a str,
    /// Reason shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<&'a str>,
    /// Ban duration in seconds; absent bans are permanent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_expires_in: Option<i64>,
}

/// Body of the sign-up call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody<'a> {
    /// Display name.
    pub name: &'a str,
    /// Email address.
    pub email: &'a str,
    /// Password.
    pub password: &'a str,
    /// Avatar URL or data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

/// Body of the sign-in call.
#[derive(Debug, Serialize)]
pub struct SignInBody<'a> {
    /// Email address.
    pub email: &'a str,
    /// Password.
    pub password: &'a str,
}

fn inner_or_null<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // The outer Option is skipped; a present field serializes its inner
    // value, with None becoming an explicit null that clears the field.
    value.as_ref().unwrap_or(&None).serialize(serializer)
}

/// Body of the profile-update call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New avatar; an explicit null clears it.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "inner_or_null")]
    pub image: Option<Option<String>>,
}

/// Body of the change-password call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody<'a> {
    /// Current password.
    pub current_password: &'a str,
    /// New password.
    pub new_password: &'a str,
    /// Whether to revoke every other session of the account.
    pub revoke_other_sessions: bool,
}
