//! Book store adapters.
//!
//! Both stores use positive integer ids and the same cursor: the decimal id
//! of the last book on the previous page.

pub mod memory_books;
pub mod sqlite_books;

pub use memory_books::MemoryBookStore;
pub use sqlite_books::SqliteBookStore;

use anyhow::Result;
use shelf_core::errors::ShelfError;

/// Largest id either store can hand out (SQLite rowids are `i64`).
pub(crate) const MAX_ID: u64 = i64::MAX as u64;

/// Numeric book id in `1..=MAX_ID`; anything else can never match a stored book.
pub(crate) fn parse_id(id: &str) -> Option<u64> {
    id.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| (1..=MAX_ID).contains(id))
}

/// Id to continue after. No cursor (or an empty one) starts from the beginning.
pub(crate) fn parse_cursor(cursor: Option<&str>) -> Result<u64> {
    match cursor.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(0),
        Some(c) => c
            .parse::<u64>()
            .map_err(|_| ShelfError::bad_request("Invalid page token").into_anyhow()),
    }
}
