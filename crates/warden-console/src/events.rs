//! Audit logging for administrative actions.
//!
//! Every directory operation and account change emits a structured
//! event. Implementations can forward them to the tracing pipeline, a
//! database, or a SIEM; tests capture them in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::OperatorAuth;

/// Kinds of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// Account created through the console or self-service sign-up.
    UserCreated,
    /// Role assignment replaced.
    RoleAssigned,
    /// Password forced by an operator.
    PasswordReset,
    /// Account banned.
    UserBanned,
    /// Ban lifted.
    UserUnbanned,
    /// Every session of an account revoked.
    SessionsRevoked,
    /// Operator started acting as another account.
    ImpersonationStarted,
    /// Operator returned to their own session.
    ImpersonationStopped,
    /// Account removed.
    UserRemoved,
    /// Profile fields changed by the account owner.
    ProfileUpdated,
    /// Password changed by the account owner.
    PasswordChanged,
    /// Operator signed in.
    SignedIn,
    /// Operator signed out.
    SignedOut,
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// The action succeeded.
    Success,
    /// The action failed.
    Failure,
}

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Kind of action.
    pub event_type: AuditEventType,
    /// Outcome.
    pub outcome: AuditOutcome,
    /// Acting operator's identifier.
    pub operator_id: Option<String>,
    /// Acting operator's email.
    pub operator_email: Option<String>,
    /// Identifier of the affected account.
    pub target_user_id: Option<String>,
    /// Error message for failures.
    pub error: Option<String>,
    /// Additional key-value details.
    pub details: Vec<(String, String)>,
}

impl AuditEvent {
    /// Creates a builder for the given action.
    #[must_use]
    pub const fn builder(event_type: AuditEventType) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type)
    }
}

/// Builder for audit events.
pub struct AuditEventBuilder {
    event_type: AuditEventType,
    outcome: AuditOutcome,
    operator_id: Option<String>,
    operator_email: Option<String>,
    target_user_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl AuditEventBuilder {
    /// Creates a builder for the given action.
    #[must_use]
    pub const fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            outcome: AuditOutcome::Success,
            operator_id: None,
            operator_email: None,
            target_user_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the acting operator from the request's auth context.
    #[must_use]
    pub fn operator(mut self, auth: &OperatorAuth) -> Self {
        self.operator_id = Some(auth.user.id.clone());
        self.operator_email = auth.user.email.clone();
        self
    }

    /// Sets the affected account.
    #[must_use]
    pub fn target(mut self, user_id: impl Into<String>) -> Self {
        self.target_user_id = Some(user_id.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Marks the action as failed with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = AuditOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            operator_id: self.operator_id,
            operator_email: self.operator_email,
            target_user_id: self.target_user_id,
            error: self.error,
            details: self.details,
        }
    }
}

/// Errors that can occur while recording an event.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The sink rejected the event.
    #[error("audit sink error: {0}")]
    Sink(String),
}

/// Sink for audit events.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Records an event.
    ///
    /// ## Errors
    ///
    /// Returns an error when the event could not be recorded; callers
    /// log and continue, a failed audit write never fails the action.
    async fn log(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Logger that writes events to the tracing pipeline at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// Creates a tracing-backed logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            outcome = ?event.outcome,
            operator_id = ?event.operator_id,
            target_user_id = ?event.target_user_id,
            error = ?event.error,
            details = ?event.details,
            "audit_event"
        );
        Ok(())
    }
}

/// In-memory logger for tests.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogger {
    events: std::sync::RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().unwrap().clone()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.write().unwrap().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_success() {
        let event = AuditEvent::builder(AuditEventType::UserBanned)
            .target("u_1")
            .detail("reason", "Spamming")
            .build();

        assert_eq!(event.event_type, AuditEventType::UserBanned);
        assert_eq!(event.outcome, AuditOutcome::Success);
        assert_eq!(event.target_user_id.as_deref(), Some("u_1"));
        assert!(event.error.is_none());
    }

    #[test]
    fn failure_carries_the_error() {
        let event = AuditEvent::builder(AuditEventType::UserRemoved)
            .failure("User u_9 was not found.")
            .build();
        assert_eq!(event.outcome, AuditOutcome::Failure);
        assert_eq!(event.error.as_deref(), Some("User u_9 was not found."));
    }

    #[tokio::test]
    async fn in_memory_logger_captures_events() {
        let logger = InMemoryAuditLogger::new();
        logger
            .log(AuditEvent::builder(AuditEventType::SignedIn).build())
            .await
            .unwrap();
        logger
            .log(AuditEvent::builder(AuditEventType::SignedOut).build())
            .await
            .unwrap();

        let events = logger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::SignedIn);
    }
}
