//! Offset/limit pagination.

use serde::{Deserialize, Serialize};

/// One page of a remote listing, with the metadata needed to drive
/// prev/next controls.
///
/// The remote service reports `total`, `limit`, and `offset` alongside
/// the items; absent metadata defaults to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching records.
    #[serde(default)]
    pub total: usize,
    /// Page size the listing was produced with.
    #[serde(default)]
    pub limit: usize,
    /// Offset of the first item.
    #[serde(default)]
    pub offset: usize,
}

impl<T> Page<T> {
    /// Creates a page from items and listing metadata.
    #[must_use]
    pub const fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// An empty page with the given window.
    #[must_use]
    pub const fn empty(limit: usize, offset: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit,
            offset,
        }
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.offset > 0
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.offset + self.limit < self.total
    }

    /// Offset of the previous page, clamped at zero.
    #[must_use]
    pub const fn previous_offset(&self) -> usize {
        self.offset.saturating_sub(self.limit)
    }

    /// Offset of the next page.
    #[must_use]
    pub const fn next_offset(&self) -> usize {
        self.offset + self.limit
    }

    /// Converts the items while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
