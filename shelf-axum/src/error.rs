use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shelf_core::errors::ShelfError;

/// Handler error: anything that converts into `anyhow::Error`.
#[derive(Debug)]
pub struct ShelfAxumError(pub anyhow::Error);

impl<E> From<E> for ShelfAxumError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ShelfAxumError {
    fn into_response(self) -> Response {
        // A ShelfError anywhere in the chain (even under contexts) keeps its status;
        // the rest of the chain is only logged.
        let safe = match ShelfError::find_in(&self.0) {
            Some(shelf) => shelf.clone(),
            None => ShelfError::general_error(self.0.to_string()),
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }

        (status, Json(safe.to_json())).into_response()
    }
}
