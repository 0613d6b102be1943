use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::CurrentUser;

/// A book record.
///
/// `id` is assigned by the [`BookStore`](crate::BookStore) on create. The
/// attribution fields are only filled when a user was signed in at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
}

impl Book {
    /// Build a book from submitted form fields.
    ///
    /// Unknown keys are ignored and empty values count as absent.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |name: &str| {
            fields
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Self {
            id: field("id"),
            title: field("title"),
            author: field("author"),
            published_date: field("published_date"),
            description: field("description"),
            image_url: field("image_url"),
            created_by: field("created_by"),
            created_by_id: field("created_by_id"),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The stored image reference, if there is a non-empty one.
    pub fn image_ref(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Set or clear the attribution fields from the current user.
    pub fn attribute_to(&mut self, user: Option<&CurrentUser>) {
        match user {
            Some(user) => {
                self.created_by = Some(user.name.clone());
                self.created_by_id = Some(user.id.clone());
            }
            None => {
                self.created_by = None;
                self.created_by_id = None;
            }
        }
    }
}

/// One page of a book listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    /// Opaque cursor for the following page, `None` on the last page.
    pub next_cursor: Option<String>,
}
