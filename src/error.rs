use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::booking::BookingError;
use crate::profile::ProfileError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::UnknownClass(_) => ApiError::NotFound(value.to_string()),
            BookingError::AlreadyInFlight(_) => ApiError::Conflict(value.to_string()),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(value: ProfileError) -> Self {
        match value {
            ProfileError::EmptyName | ProfileError::NameTooLong(_) => {
                ApiError::BadRequest(value.to_string())
            }
            ProfileError::Persist(err) => {
                error!("Profile write error: {err}");
                ApiError::Internal("Failed to save changes".into())
            }
        }
    }
}
