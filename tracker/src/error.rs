use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dai_tracker::TrackerError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Chain read failed; the detail is logged, the client gets a generic notice
    #[error("Failed to fetch balances from the network, please try again")]
    ChainUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        if err.is_fetch_error() {
            log::warn!("Chain fetch failed: {}", err);
            return ApiError::ChainUnavailable(err.to_string());
        }
        match err {
            TrackerError::StorageFailed(_)
            | TrackerError::RemoteStoreFailed(_)
            | TrackerError::SerializationError(_) => ApiError::Storage(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::ChainUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
