//! Keyset pagination types for history endpoints.
//!
//! Pages are addressed by the id of the last record the caller has seen,
//! never by a numeric offset.

use serde::{Deserialize, Serialize};

/// Page size clamped to the range the history endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerPage(u64);

impl PerPage {
    /// Smallest page size.
    pub const MIN: u64 = 10;
    /// Largest page size.
    pub const MAX: u64 = 50;

    /// Clamps a requested page size into `[MIN, MAX]`.
    ///
    /// Missing and negative values fall back to `MIN`.
    #[must_use]
    pub fn clamped(requested: Option<i64>) -> Self {
        let requested = requested.and_then(|n| u64::try_from(n).ok()).unwrap_or(Self::MIN);
        Self(requested.clamp(Self::MIN, Self::MAX))
    }

    /// Returns the page size.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for PerPage {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

/// One page of keyset-paginated results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T, C> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Cursor for the next page (the last item's key).
    pub next_cursor: Option<C>,
    /// True when the page is full and another request may return more.
    pub can_load_more: bool,
}

impl<T, C> CursorPage<T, C> {
    /// Builds a page, deriving the next cursor from the last item.
    #[must_use]
    pub fn new(items: Vec<T>, per_page: PerPage, cursor_of: impl Fn(&T) -> C) -> Self {
        let can_load_more = items.len() as u64 >= per_page.get();
        let next_cursor = items.last().map(cursor_of);
        Self {
            items,
            next_cursor,
            can_load_more,
        }
    }
}
