//! # REST API Interface Layer
//!
//! HTTP endpoints for the points tracker backend. Handlers are a pure
//! translation layer: log the request, call a domain service, map the result
//! onto a status code. A genuine backend outage maps to 503 so clients can
//! render a "couldn't load" state instead of a misleading zero wallet.

pub mod award_apis;
pub mod child_apis;
pub mod wallet_apis;

pub use award_apis::*;
pub use child_apis::*;
pub use wallet_apis::*;

use axum::http::StatusCode;

use crate::domain::errors::PointsError;

/// Map a domain error onto the HTTP status and message for the caller.
pub(crate) fn points_error_response(e: &PointsError) -> (StatusCode, String) {
    match e {
        PointsError::InvalidIdentifier(_) | PointsError::Validation(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        PointsError::BackendUnavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Points backend unavailable".to_string(),
        ),
        PointsError::AwardUnconfirmed(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
