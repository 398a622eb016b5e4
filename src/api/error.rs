use crate::{auth::AuthError, lot::LotError};
use axum::{
    http::{
        header::{RETRY_AFTER, WWW_AUTHENTICATE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Error payload returned by every failing endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    /// Stable, machine-readable reason.
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Lot(#[from] LotError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("invalid request")]
    InvalidRequest,
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status_and_reason(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Lot(err @ LotError::OccupantNotFound(_)) => (StatusCode::NOT_FOUND, err.reason()),
            Self::Lot(err) => (StatusCode::BAD_REQUEST, err.reason()),
            Self::Auth(AuthError::MissingToken) => (StatusCode::UNAUTHORIZED, "missing token"),
            Self::Auth(AuthError::InvalidToken) => (StatusCode::UNAUTHORIZED, "invalid token"),
            Self::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "invalid credentials")
            }
            Self::Auth(_) | Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
            Self::InvalidRequest => (StatusCode::BAD_REQUEST, "invalid request"),
            Self::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded"),
        }
    }
}

/// Whole seconds to wait, never less than one.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    let secs = if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    };
    secs.max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = self.status_and_reason();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {self}");
        }

        let mut response = (
            status,
            Json(ErrorBody {
                error: reason.to_string(),
            }),
        )
            .into_response();

        let headers = response.headers_mut();
        match self {
            Self::RateLimited { retry_after } => {
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(retry_after)));
            }
            Self::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            _ => {}
        }

        response
    }
}
