use anyhow::Result;
use async_trait::async_trait;

use crate::{Book, BookPage};

/// Persistent CRUD over books with forward-only cursor pagination.
///
/// Implementations own their consistency; callers never hold locks across
/// calls. Cursors are opaque to callers and must be passed back unmodified.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// List up to `limit` books starting after `cursor`.
    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<BookPage>;

    /// Insert a book and return its assigned id. Any `id` on the input is ignored.
    async fn create(&self, book: Book) -> Result<String>;

    async fn read(&self, id: &str) -> Result<Option<Book>>;

    /// Replace every field of the book identified by `book.id`.
    ///
    /// Returns `false` when nothing was replaced.
    async fn update(&self, book: Book) -> Result<bool>;

    async fn delete(&self, id: &str) -> Result<()>;
}
