use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use shelf_axum::{FormSubmission, MaybeUser, ShelfAxumError};
use shelf_blob::BlobError;
use shelf_core::Book;

use crate::app::BookshelfState;

type HandlerResult = Result<Response, ShelfAxumError>;

pub fn routes(state: BookshelfState) -> Router<()> {
    Router::new()
        .route("/", get(root))
        .route("/books/", get(list_books))
        .route("/books/add", get(add_form).post(create_book))
        .route("/books/{id}", get(view_book))
        .route("/books/{id}/edit", get(edit_form).post(update_book))
        .route("/books/{id}/delete", post(delete_book))
        .route("/exception", get(exception))
        .with_state(state)
}

/// 302 Found; `Redirect` only offers 303/307/308.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

fn render(state: &BookshelfState, template: &str, context: serde_json::Value) -> HandlerResult {
    Ok(Html(state.renderer.render(template, context)?).into_response())
}

/// Store a valid `image` upload and return its reference.
async fn store_image(
    state: &BookshelfState,
    form: &FormSubmission,
) -> Result<Option<String>, ShelfAxumError> {
    let Some(image) = form.valid_file("image") else {
        return Ok(None);
    };
    let reference = state.blobs.store_file(image.path(), image.mime_type()).await?;
    Ok(Some(reference))
}

async fn root() -> Response {
    found("/books/".to_string())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page_token: Option<String>,
}

async fn list_books(State(state): State<BookshelfState>, Query(query): Query<ListQuery>) -> HandlerResult {
    let token = query.page_token.as_deref().filter(|t| !t.is_empty());
    let page = state.books.list(state.page_size, token).await?;

    render(
        &state,
        "list.html",
        json!({
            "books": page.books,
            "next_page_token": page.next_cursor,
        }),
    )
}

async fn add_form(State(state): State<BookshelfState>) -> HandlerResult {
    render(&state, "form.html", json!({ "action": "Add", "book": {} }))
}

async fn create_book(
    State(state): State<BookshelfState>,
    MaybeUser(user): MaybeUser,
    form: FormSubmission,
) -> HandlerResult {
    let mut book = Book::from_fields(&form.fields);
    book.id = None;
    book.image_url = store_image(&state, &form).await?;
    book.attribute_to(user.as_ref());

    let image_url = book.image_url.clone();
    let id = match state.books.create(book).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(reference) = image_url {
                tracing::warn!(%reference, "book was not created, cover image left orphaned");
            }
            return Err(e.into());
        }
    };

    Ok(found(format!("/books/{id}")))
}

async fn view_book(State(state): State<BookshelfState>, Path(id): Path<String>) -> HandlerResult {
    match state.books.read(&id).await? {
        Some(book) => render(&state, "view.html", json!({ "book": book })),
        None => Ok(not_found()),
    }
}

async fn edit_form(State(state): State<BookshelfState>, Path(id): Path<String>) -> HandlerResult {
    match state.books.read(&id).await? {
        Some(book) => render(&state, "form.html", json!({ "action": "Edit", "book": book })),
        None => Ok(not_found()),
    }
}

async fn update_book(
    State(state): State<BookshelfState>,
    Path(id): Path<String>,
    form: FormSubmission,
) -> HandlerResult {
    // The path id wins over any submitted id.
    let mut book = Book::from_fields(&form.fields).with_id(id.clone());

    let Some(existing) = state.books.read(&id).await? else {
        return Ok(not_found());
    };

    // Attribution belongs to the creator; the cover stays unless replaced.
    // A replaced cover is not deleted.
    book.created_by = existing.created_by;
    book.created_by_id = existing.created_by_id;
    let uploaded = store_image(&state, &form).await?;
    book.image_url = uploaded.clone().or(existing.image_url);

    if state.books.update(book).await? {
        return Ok(found(format!("/books/{id}")));
    }

    if let Some(reference) = uploaded {
        tracing::warn!(%reference, book_id = %id, "book was not updated, cover image left orphaned");
    }
    Ok("Could not update book".into_response())
}

async fn delete_book(State(state): State<BookshelfState>, Path(id): Path<String>) -> HandlerResult {
    let Some(book) = state.books.read(&id).await? else {
        return Ok(not_found());
    };

    state.books.delete(&id).await?;

    if let Some(reference) = book.image_ref() {
        match state.blobs.delete_file(reference).await {
            Ok(()) => {}
            Err(BlobError::NotFound { .. }) => {
                tracing::warn!(%reference, book_id = %id, "cover image already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(book_id = %id, "Deleted Book");
    Ok(Redirect::to("/books/").into_response())
}

async fn exception() -> HandlerResult {
    Err(anyhow::anyhow!("Test").into())
}
