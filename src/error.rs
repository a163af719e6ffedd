use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Fatal problems with a single crawl line. Missing markup is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unknown page type {page_type:?} at line {line}")]
    UnknownPageType { line: usize, page_type: String },

    #[error("missing field `{field}` at line {line}")]
    MissingField { line: usize, field: &'static str },

    #[error("malformed JSON at line {line}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A listing record lacks crawl metadata the extractor needs.
#[derive(Debug, thiserror::Error)]
#[error("missing field `{0}`")]
pub struct MissingField(pub &'static str);

/// Errors surfaced by the query API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found!")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database connection poisoned")]
    Poisoned,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Path segments that do not parse as ids name no resource.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(%rejection, "unusable path");
        ApiError::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound => self.to_string(),
            _ => {
                tracing::error!(error = %self, "query failed");
                "Internal server error".to_string()
            }
        };
        let body = serde_json::json!({ "code": status.as_u16(), "message": message });
        (status, Json(body)).into_response()
    }
}
