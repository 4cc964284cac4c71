//! Page requests and paginated result envelopes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{PaginationError, decode_cursor, encode_cursor};

/// Page size used when a client omits `limit` or sends a non-positive value.
pub const DEFAULT_LIMIT: usize = 30;

/// Largest page size a client may request.
pub const MAX_LIMIT: usize = 100;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
///
/// Non-positive requests fall back to [`DEFAULT_LIMIT`].
///
/// # Examples
///
/// ```
/// use pagination::normalize_limit;
///
/// assert_eq!(normalize_limit(0), 30);
/// assert_eq!(normalize_limit(1000), 100);
/// assert_eq!(normalize_limit(10), 10);
/// ```
pub fn normalize_limit(requested: i64) -> usize {
    if requested <= 0 {
        return DEFAULT_LIMIT;
    }
    usize::try_from(requested).map_or(MAX_LIMIT, |limit| limit.min(MAX_LIMIT))
}

/// Validated pagination parameters for one repository call.
///
/// The cursor stays an opaque token here; repositories decode it into the
/// typed key their query expects with [`Page::cursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    cursor: Option<String>,
    limit: usize,
}

impl Page {
    /// First page with the given (normalised) size.
    pub fn first(limit: i64) -> Self {
        Self {
            cursor: None,
            limit: normalize_limit(limit),
        }
    }

    /// Raw cursor token, if the client supplied one.
    pub fn cursor_token(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Normalised page size.
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Row count to request from the database: one more than the page size,
    /// so the builder can tell whether another page exists.
    pub fn fetch_limit(&self) -> i64 {
        i64::try_from(self.limit.saturating_add(1)).unwrap_or(i64::MAX)
    }

    /// Decode the cursor into the keyset position `K`.
    ///
    /// # Errors
    ///
    /// Returns a [`PaginationError`] when the token does not decode into `K`,
    /// for example when a cursor from another listing is replayed here.
    pub fn cursor<K: DeserializeOwned>(&self) -> Result<Option<K>, PaginationError> {
        self.cursor
            .as_deref()
            .map_or(Ok(None), decode_cursor::<K>)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Any cursor this crate mints; each carries an `id`.
#[derive(Deserialize)]
struct AnyCursor {
    #[serde(rename = "id")]
    _id: i64,
}

/// Normalise inbound pagination parameters.
///
/// A non-empty cursor is decoded once to reject malformed tokens early. The
/// check accepts any cursor shape that carries its `id` tie-breaker; the
/// repository performs the strict, typed decode later.
///
/// # Errors
///
/// Returns a [`PaginationError`] when `cursor` is non-empty and malformed.
pub fn validate_page(cursor: &str, limit: i64) -> Result<Page, PaginationError> {
    let limit = normalize_limit(limit);
    if cursor.is_empty() {
        return Ok(Page {
            cursor: None,
            limit,
        });
    }

    decode_cursor::<AnyCursor>(cursor)?;
    Ok(Page {
        cursor: Some(cursor.to_owned()),
        limit,
    })
}

/// One page of results plus the token for the next page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page, in query order.
    pub data: Vec<T>,
    /// Opaque token for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
    /// Whether another page exists.
    pub has_more: bool,
}

impl<T> Paginated<T> {
    /// Build a page from rows fetched with `limit + 1`.
    ///
    /// The extra row only signals that another page exists; it is dropped
    /// before the page is returned. `items` must already be ordered by the
    /// key `cursor_key` extracts.
    pub fn from_overfetch<K, F>(mut items: Vec<T>, limit: usize, cursor_key: F) -> Self
    where
        K: Serialize,
        F: Fn(&T) -> K,
    {
        let has_more = items.len() > limit;
        if has_more {
            items.truncate(limit);
        }

        let next_cursor = if has_more {
            items.last().map(|last| encode_cursor(&cursor_key(last)))
        } else {
            None
        };

        Self {
            data: items,
            next_cursor,
            has_more,
        }
    }

    /// A page with no items and no successor.
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// Convert each item while keeping the cursor metadata.
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }

    /// URL of the following page, derived from `base` with `cursor` and
    /// `limit` query parameters replaced.
    ///
    /// Returns `None` on the last page.
    pub fn next_page_url(&self, base: &Url, limit: usize) -> Option<Url> {
        let cursor = self.next_cursor.as_deref()?;
        let mut next = base.clone();
        let retained: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| key != "cursor" && key != "limit")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        next.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("cursor", cursor)
            .append_pair("limit", &limit.to_string());
        Some(next)
    }
}
