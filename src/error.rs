use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::session::SessionError;
use crate::views::ViewError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Sign in required")]
    Unauthorized,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Session(SessionError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Session(SessionError::EmailAlreadyRegistered) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::Encode(_) | SessionError::Storage(_)) => {
                error!("Session persistence failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::View(ViewError::CatalogUnavailable) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => {
                error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
