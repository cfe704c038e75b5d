//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::RewardsError;
use crate::store::StoreError;

/// Application-level error type for the rewards service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Rewards workflow failed.
    #[error("rewards error: {0}")]
    Rewards(#[from] RewardsError),

    /// Store operation failed outside a workflow.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error indicates a server fault rather than a caller
    /// mistake. Server faults are captured to Sentry.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Store(_) | Self::Internal(_) | Self::Rewards(RewardsError::Store(_)) => true,
            Self::Rewards(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rewards(err) => match err {
                RewardsError::CustomerNotFound | RewardsError::OptionNotFound => {
                    StatusCode::NOT_FOUND
                }
                RewardsError::OptionInactive
                | RewardsError::InsufficientPoints { .. }
                | RewardsError::InvalidAmount => StatusCode::BAD_REQUEST,
                RewardsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(_) | Self::Internal(_) | Self::Rewards(RewardsError::Store(_)) => {
                "Internal server error".to_owned()
            }
            Self::Rewards(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn business_rule_violations_map_to_4xx() {
        assert_eq!(
            get_status(AppError::Rewards(RewardsError::CustomerNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Rewards(RewardsError::OptionNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Rewards(RewardsError::OptionInactive)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Rewards(RewardsError::InsufficientPoints {
                have: 499,
                need: 500
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_faults_map_to_500() {
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_points_message_names_both_sides() {
        let err = AppError::Rewards(RewardsError::InsufficientPoints {
            have: 499,
            need: 500,
        });
        assert_eq!(
            err.to_string(),
            "rewards error: insufficient points: have 499, need 500"
        );
    }
}
