use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_core::{Book, BookPage, BookStore};

use super::{parse_cursor, parse_id};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    author TEXT,
    published_date TEXT,
    description TEXT,
    image_url TEXT,
    created_by TEXT,
    created_by_id TEXT
)";

const COLUMNS: &str =
    "id, title, author, published_date, description, image_url, created_by, created_by_id";

/// Books in a SQLite database.
///
/// rusqlite is blocking, so every call runs on the blocking pool with the
/// connection behind a mutex.
#[derive(Clone)]
pub struct SqliteBookStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open book database {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA encoding = 'UTF-8'", [])?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| anyhow!("book database connection poisoned"))?;
            f(&conn)
        })
        .await?
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let id: i64 = row.get(0)?;
    Ok(Book {
        id: Some(id.to_string()),
        title: row.get(1)?,
        author: row.get(2)?,
        published_date: row.get(3)?,
        description: row.get(4)?,
        image_url: row.get(5)?,
        created_by: row.get(6)?,
        created_by_id: row.get(7)?,
    })
}

/// Rowid for a book id; ids that can't be a rowid match nothing.
fn sql_id(id: &str) -> Option<i64> {
    parse_id(id).and_then(|id| i64::try_from(id).ok())
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<BookPage> {
        let after = parse_cursor(cursor)?;
        // Cursors past the largest rowid match nothing.
        let after = i64::try_from(after).unwrap_or(i64::MAX);
        let fetch = i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM books WHERE id > ?1 ORDER BY id LIMIT ?2"
            ))?;
            let mut books = stmt
                .query_map(params![after, fetch], book_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let next_cursor = if books.len() > limit {
                books.truncate(limit);
                books.last().and_then(|b| b.id.clone())
            } else {
                None
            };
            Ok(BookPage { books, next_cursor })
        })
        .await
    }

    async fn create(&self, book: Book) -> Result<String> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO books (title, author, published_date, description, image_url, created_by, created_by_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    book.title,
                    book.author,
                    book.published_date,
                    book.description,
                    book.image_url,
                    book.created_by,
                    book.created_by_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            tracing::debug!(book_id = id, "created book");
            Ok(id.to_string())
        })
        .await
    }

    async fn read(&self, id: &str) -> Result<Option<Book>> {
        let Some(id) = sql_id(id) else {
            return Ok(None);
        };

        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM books WHERE id = ?1"),
                    [id],
                    book_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn update(&self, book: Book) -> Result<bool> {
        let Some(id) = book.id.as_deref().and_then(sql_id) else {
            return Ok(false);
        };

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE books SET title = ?2, author = ?3, published_date = ?4, description = ?5,
                 image_url = ?6, created_by = ?7, created_by_id = ?8
                 WHERE id = ?1",
                params![
                    id,
                    book.title,
                    book.author,
                    book.published_date,
                    book.description,
                    book.image_url,
                    book.created_by,
                    book.created_by_id,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let Some(id) = sql_id(id) else {
            return Ok(());
        };

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM books WHERE id = ?1", [id])?;
            Ok(())
        })
        .await
    }
}
