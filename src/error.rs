use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Terminal failure classes; the caller retries by re-invoking the operation.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Fetch(err.to_string())
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match self {
            EngineError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            EngineError::Auth { .. } => StatusCode::UNAUTHORIZED,
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}
