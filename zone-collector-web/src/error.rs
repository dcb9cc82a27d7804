//! Core-to-HTTP error mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use zone_collector_core::error::CoreError;

/// Newtype adapter rendering [`CoreError`] as a structured JSON response.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::TldNotFound(_) | CoreError::RunNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::SyncInProgress => StatusCode::CONFLICT,
            CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CoreError::Czds(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.0.is_expected() {
            tracing::warn!("{}", self.0);
        } else {
            tracing::error!("{}", self.0);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.0.to_string(),
            "error": self.0,
        }))
    }
}
