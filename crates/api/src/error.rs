use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use oddspulse_models::PulseError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pulse(#[from] PulseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Pulse(PulseError::MatchNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Pulse(PulseError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pulse(_) => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }

        let body = Json(json!({
            "success": false,
            "data": null,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
