use std::collections::BTreeMap;
use std::ops::Bound;

use anyhow::Result;
use async_trait::async_trait;
use shelf_core::{Book, BookPage, BookStore};
use tokio::sync::RwLock;

use super::{parse_cursor, parse_id};

#[derive(Default)]
struct Inner {
    last_id: u64,
    books: BTreeMap<u64, Book>,
}

/// Books kept in process memory, ordered by numeric id.
///
/// Ids start at 1 and are never reused; the page cursor is the last id of
/// the page, like the SQLite store.
#[derive(Default)]
pub struct MemoryBookStore {
    inner: RwLock<Inner>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<BookPage> {
        let after = parse_cursor(cursor)?;
        let inner = self.inner.read().await;

        let mut books: Vec<Book> = inner
            .books
            .range((Bound::Excluded(after), Bound::Unbounded))
            .take(limit.saturating_add(1))
            .map(|(_, book)| book.clone())
            .collect();

        let next_cursor = if books.len() > limit {
            books.truncate(limit);
            books.last().and_then(|b| b.id.clone())
        } else {
            None
        };

        Ok(BookPage { books, next_cursor })
    }

    async fn create(&self, book: Book) -> Result<String> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.books.insert(id, book.with_id(id.to_string()));
        tracing::debug!(book_id = id, "created book");
        Ok(id.to_string())
    }

    async fn read(&self, id: &str) -> Result<Option<Book>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn update(&self, book: Book) -> Result<bool> {
        let Some(id) = book.id.as_deref().and_then(parse_id) else {
            return Ok(false);
        };
        let mut inner = self.inner.write().await;
        match inner.books.get_mut(&id) {
            Some(stored) => {
                *stored = book;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if let Some(id) = parse_id(id) {
            self.inner.write().await.books.remove(&id);
        }
        Ok(())
    }
}
