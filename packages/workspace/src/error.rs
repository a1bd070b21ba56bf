use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_editor::{ChartError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Version control is disabled")]
    VersionControlDisabled,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::VersionControlDisabled => StatusCode::FORBIDDEN,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(StoreError::MissingContent) => StatusCode::BAD_REQUEST,
            ServerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Chart(ChartError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ServerError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
