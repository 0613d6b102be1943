//! shelf-core: framework-agnostic core for the bookshelf application.
//!
//! Holds the book model, the [`BookStore`] collaborator trait, the
//! per-request [`CurrentUser`], structured errors and configuration.

pub mod book;
pub mod config;
pub mod errors;
pub mod store;
pub mod user;

pub use book::{Book, BookPage};
pub use config::ShelfConfig;
pub use errors::{ErrorKind, ShelfError};
pub use store::BookStore;
pub use user::CurrentUser;
