//! Opaque cursor and pagination envelope primitives.
//!
//! Repositories page through result sets with keyset pagination: each page is
//! addressed by the last sort key the client saw rather than by an offset.
//! This crate owns the pieces of that contract that do not touch a database:
//!
//! - [`encode_cursor`] / [`decode_cursor`] turn a small key struct
//!   ([`NameCursor`], [`DateCursor`]) into a transport-safe token and back.
//! - [`Paginated`] builds the `{data, nextCursor, hasMore}` envelope from a
//!   `limit + 1` over-fetch, so no `COUNT` query is needed.
//! - [`normalize_limit`] and [`validate_page`] sanitise inbound query
//!   parameters into a [`Page`].
//!
//! # Examples
//!
//! ```
//! use pagination::{NameCursor, Paginated, validate_page};
//!
//! let page = validate_page("", 2).expect("empty cursor is the first page");
//! let rows = vec![(1, "apple"), (2, "basil"), (3, "cumin")];
//! let result = Paginated::from_overfetch(rows, page.limit(), |(id, name)| NameCursor {
//!     id: *id,
//!     name: (*name).to_owned(),
//! });
//!
//! assert!(result.has_more);
//! assert_eq!(result.data.len(), 2);
//! let next = validate_page(result.next_cursor.as_deref().unwrap_or_default(), 2)
//!     .expect("cursor produced by the codec is valid");
//! let cursor: Option<NameCursor> = next.cursor().expect("typed decode");
//! assert_eq!(cursor.map(|c| c.id), Some(2));
//! ```

mod cursor;
mod error;
mod page;

pub use cursor::{DateCursor, NameCursor, decode_cursor, encode_cursor};
pub use error::PaginationError;
pub use page::{DEFAULT_LIMIT, MAX_LIMIT, Page, Paginated, normalize_limit, validate_page};
