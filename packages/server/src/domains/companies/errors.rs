use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::kernel::publisher::PublishError;
use crate::kernel::store::StoreError;

/// Errors surfaced by company actions.
#[derive(Error, Debug)]
pub enum CompanyError {
    #[error("Invalid company id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl CompanyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CompanyError::InvalidId(_) => StatusCode::BAD_REQUEST,
            CompanyError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            CompanyError::Store(e) if e.is_invalid_request() => StatusCode::BAD_REQUEST,
            CompanyError::Store(_) | CompanyError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CompanyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Company request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
