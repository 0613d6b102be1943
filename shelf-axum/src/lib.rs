//! shelf-axum: Axum glue for the bookshelf application.
//!
//! Form and multipart submissions with spooled uploads, optional identity,
//! error responses, and the [`ShelfApp`] router wrapper.

pub mod app;
pub mod form;
pub mod identity;
mod error;

pub use app::ShelfApp;
pub use error::ShelfAxumError;
pub use form::{FormSubmission, UploadLimits, UploadedFile};
pub use identity::{Anonymous, IdentityResolver, JwtIdentity, MaybeUser};
