use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediascan_analysis::AnalysisError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("{0}")]
    Timeout(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let body = ErrorResponse {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Timeout(_) => ApiError::Timeout(err.to_string()),
            // An empty video never gets here: the engine answers it with an envelope.
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
