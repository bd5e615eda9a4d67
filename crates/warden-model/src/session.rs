//! Operator session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserRecord;

/// A session token minted by the remote identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    /// Opaque bearer token.
    pub token: String,

    /// When the session lapses, if the service reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Identifier of the operator acting through this session, set only
    /// on sessions minted by impersonation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<String>,
}

impl SessionHandle {
    /// Creates a handle for the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
            impersonated_by: None,
        }
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub const fn with_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Marks the session as impersonated by the given operator.
    #[must_use]
    pub fn with_impersonated_by(mut self, operator_id: impl Into<String>) -> Self {
        self.impersonated_by = Some(operator_id.into());
        self
    }

    /// Whether this session was minted by impersonation.
    #[must_use]
    pub const fn is_impersonated(&self) -> bool {
        self.impersonated_by.is_some()
    }
}

/// An authenticated operator: the session plus the account it signs in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSession {
    /// The account the session authenticates.
    pub user: UserRecord,
    /// The session itself.
    pub session: SessionHandle,
}

impl OperatorSession {
    /// Pairs a user with a session handle.
    #[must_use]
    pub const fn new(user: UserRecord, session: SessionHandle) -> Self {
        Self { user, session }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_session_is_not_impersonated() {
        let handle = SessionHandle::new("tok_1");
        assert!(!handle.is_impersonated());
    }

    #[test]
    fn impersonated_session_names_the_operator() {
        let handle = SessionHandle::new("tok_2").with_impersonated_by("u_admin");
        assert!(handle.is_impersonated());
        assert_eq!(handle.impersonated_by.as_deref(), Some("u_admin"));
    }
}
