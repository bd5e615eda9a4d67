//! Directory search criteria.

use serde::{Deserialize, Serialize};

/// Field the free-text search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    /// Match against the email address.
    #[default]
    Email,
    /// Match against the display name.
    Name,
}

impl SearchField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
        }
    }
}

/// Field the listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Order by display name.
    #[default]
    Name,
    /// Order by email address.
    Email,
    /// Order by creation time.
    CreatedAt,
}

impl SortField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::CreatedAt => "createdAt",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDirection {
    /// Wire name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Search criteria for the user directory.
///
/// Defaults match the console's initial view: search by email, sort by
/// name descending, twenty records from the start of the listing.
#[derive(Debug, Clone)]
pub struct UserQuery {
    /// Free-text search value; `None` when the operator left it blank.
    pub search_value: Option<String>,
    /// Field the search runs against.
    pub search_field: SearchField,
    /// Sort key.
    pub sort_by: SortField,
    /// Sort direction.
    pub sort_direction: SortDirection,
    /// Page size.
    pub limit: usize,
    /// Offset of the first record.
    pub offset: usize,
    /// Optional equality filter on the banned flag.
    pub banned: Option<bool>,
}

/// Default page size of the directory.
pub const DEFAULT_LIMIT: usize = 20;

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search_value: None,
            search_field: SearchField::default(),
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            banned: None,
        }
    }
}

impl UserQuery {
    /// Creates a query with the default view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search value; blank input clears it.
    #[must_use]
    pub fn search(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        self.search_value = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Sets the field the search runs against.
    #[must_use]
    pub const fn search_field(mut self, field: SearchField) -> Self {
        self.search_field = field;
        self
    }

    /// Sets the sort key and direction.
    #[must_use]
    pub const fn sort(mut self, by: SortField, direction: SortDirection) -> Self {
        self.sort_by = by;
        self.sort_direction = direction;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the offset.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Filters on the banned flag.
    #[must_use]
    pub const fn banned(mut self, banned: bool) -> Self {
        self.banned = Some(banned);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_console_view() {
        let query = UserQuery::new();
        assert_eq!(query.search_value, None);
        assert_eq!(query.search_field, SearchField::Email);
        assert_eq!(query.sort_by, SortField::Name);
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
        assert_eq!(query.banned, None);
    }

    #[test]
    fn blank_search_is_dropped() {
        let query = UserQuery::new().search("   ");
        assert_eq!(query.search_value, None);

        let query = UserQuery::new().search("  ada ");
        assert_eq!(query.search_value.as_deref(), Some("ada"));
    }

    #[test]
    fn wire_names() {
        assert_eq!(SearchField::Name.as_str(), "name");
        assert_eq!(SortField::CreatedAt.as_str(), "createdAt");
        assert_eq!(SortDirection::Asc.as_str(), "asc");
    }
}
