//! Transient per-field save status.
//!
//! The account page edits fields inline (name, avatar, password) and
//! shows a short-lived status beside each one. A successful save shows
//! its message for a fixed window and then falls back to idle; a failed
//! save sticks until the operator edits the field again.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a successful save stays visible, in milliseconds.
pub const STATUS_RESET_DELAY_MS: i64 = 2200;

/// Save state of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing in flight, nothing to show.
    #[default]
    Idle,
    /// A save request is outstanding; further submits are blocked.
    Saving,
    /// The last save succeeded.
    Saved,
    /// The last save failed; the previous value was restored.
    Error,
}

#[derive(Debug, Clone)]
struct FieldStatus {
    status: SaveStatus,
    message: Option<String>,
    since: DateTime<Utc>,
}

/// Tracks the save status of the fields on one page.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    fields: HashMap<String, FieldStatus>,
}

impl StatusBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a field as having a save in flight.
    pub fn begin(&mut self, field: impl Into<String>, now: DateTime<Utc>) {
        self.fields.insert(
            field.into(),
            FieldStatus {
                status: SaveStatus::Saving,
                message: Some("Saving...".to_string()),
                since: now,
            },
        );
    }

    /// Records a successful save.
    pub fn saved(&mut self, field: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) {
        self.fields.insert(
            field.into(),
            FieldStatus {
                status: SaveStatus::Saved,
                message: Some(message.into()),
                since: now,
            },
        );
    }

    /// Records a failed save.
    pub fn failed(&mut self, field: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) {
        self.fields.insert(
            field.into(),
            FieldStatus {
                status: SaveStatus::Error,
                message: Some(message.into()),
                since: now,
            },
        );
    }

    /// Resets a field to idle, e.g. when the operator edits it again.
    pub fn clear(&mut self, field: &str) {
        self.fields.remove(field);
    }

    /// Whether a save for the field is outstanding. Used to block a
    /// second submit while the first is in flight.
    #[must_use]
    pub fn is_saving(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .map(|f| f.status == SaveStatus::Saving)
            .unwrap_or(false)
    }

    /// Current status and message of a field.
    ///
    /// A `Saved` entry older than [`STATUS_RESET_DELAY_MS`] reads as
    /// idle; errors stick until cleared.
    #[must_use]
    pub fn current(&self, field: &str, now: DateTime<Utc>) -> (SaveStatus, Option<&str>) {
        match self.fields.get(field) {
            None => (SaveStatus::Idle, None),
            Some(entry) => {
                let elapsed = now.signed_duration_since(entry.since).num_milliseconds();
                if entry.status == SaveStatus::Saved && elapsed >= STATUS_RESET_DELAY_MS {
                    (SaveStatus::Idle, None)
                } else {
                    (entry.status, entry.message.as_deref())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn untouched_field_is_idle() {
        let board = StatusBoard::new();
        assert_eq!(board.current("name", Utc::now()), (SaveStatus::Idle, None));
    }

    #[test]
    fn saved_resets_to_idle_after_the_delay() {
        let mut board = StatusBoard::new();
        let t0 = Utc::now();
        board.saved("name", "Saved.", t0);

        assert_eq!(
            board.current("name", t0),
            (SaveStatus::Saved, Some("Saved."))
        );
        let just_before = t0 + Duration::milliseconds(STATUS_RESET_DELAY_MS - 1);
        assert_eq!(
            board.current("name", just_before),
            (SaveStatus::Saved, Some("Saved."))
        );
        let after = t0 + Duration::milliseconds(STATUS_RESET_DELAY_MS);
        assert_eq!(board.current("name", after), (SaveStatus::Idle, None));
    }

    #[test]
    fn error_sticks_until_cleared() {
        let mut board = StatusBoard::new();
        let t0 = Utc::now();
        board.failed("name", "Name cannot be empty.", t0);

        let much_later = t0 + Duration::seconds(60);
        assert_eq!(
            board.current("name", much_later),
            (SaveStatus::Error, Some("Name cannot be empty."))
        );

        board.clear("name");
        assert_eq!(board.current("name", much_later), (SaveStatus::Idle, None));
    }

    #[test]
    fn saving_blocks_resubmission() {
        let mut board = StatusBoard::new();
        let t0 = Utc::now();
        board.begin("password", t0);
        assert!(board.is_saving("password"));

        board.saved("password", "Password updated.", t0 + Duration::seconds(1));
        assert!(!board.is_saving("password"));
    }

    #[test]
    fn fields_are_tracked_independently() {
        let mut board = StatusBoard::new();
        let t0 = Utc::now();
        board.saved("name", "Saved.", t0);
        board.failed("image", "Update failed.", t0);

        assert_eq!(board.current("name", t0).0, SaveStatus::Saved);
        assert_eq!(board.current("image", t0).0, SaveStatus::Error);
        assert_eq!(board.current("password", t0).0, SaveStatus::Idle);
    }
}
