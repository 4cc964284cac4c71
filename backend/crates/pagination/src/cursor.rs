//! Cursor codec.
//!
//! A cursor is the last sort key a client saw, serialised to JSON and wrapped
//! in URL-safe base64 without padding so it can travel in a query string
//! unescaped. Typed cursors reject unknown fields, which makes a token minted
//! for one query shape fail loudly when replayed against another.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::PaginationError;

/// Keyset position for listings ordered by `(name, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameCursor {
    /// Id of the last row on the previous page; breaks ties between equal names.
    pub id: i64,
    /// Name of the last row on the previous page.
    pub name: String,
}

/// Keyset position for listings ordered by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateCursor {
    /// Id of the last row seen on `date`.
    pub id: i64,
    /// Last date on the previous page.
    pub date: NaiveDate,
}

/// Encode a cursor key into an opaque token.
///
/// Cursor keys are plain data owned by the caller, so serialisation cannot
/// fail in practice. If it ever does, the failure is logged and an empty
/// token is returned, which clients read as "no further page".
///
/// # Examples
///
/// ```
/// use pagination::{NameCursor, decode_cursor, encode_cursor};
///
/// let cursor = NameCursor { id: 7, name: "Shakshuka".to_owned() };
/// let token = encode_cursor(&cursor);
/// assert_eq!(decode_cursor::<NameCursor>(&token), Ok(Some(cursor)));
/// ```
pub fn encode_cursor<K: Serialize>(key: &K) -> String {
    match serde_json::to_vec(key) {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(err) => {
            error!(error = %err, "failed to serialise pagination cursor");
            String::new()
        }
    }
}

/// Decode an opaque token into a typed cursor key.
///
/// An empty token means "first page" and yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`PaginationError::InvalidEncoding`] when the token is not
/// base64, and [`PaginationError::InvalidPayload`] when it does not decode
/// into `K` (wrong shape, missing keys, or trailing garbage).
pub fn decode_cursor<K: DeserializeOwned>(token: &str) -> Result<Option<K>, PaginationError> {
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|err| PaginationError::invalid_encoding(err.to_string()))?;

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| PaginationError::invalid_payload(err.to_string()))
}
