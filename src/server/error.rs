use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::error::{ScanError, SortError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Sort(#[from] SortError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Scan(ScanError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Scan(ScanError::NotADirectory { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Scan(ScanError::PermissionDenied { .. }) => StatusCode::FORBIDDEN,
            ApiError::Scan(ScanError::Io { .. } | ScanError::Join(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Sort(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
