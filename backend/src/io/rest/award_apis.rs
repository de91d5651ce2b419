//! # REST API for Point Awards

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info};

use crate::io::rest::points_error_response;
use crate::AppState;
use shared::AwardPointsRequest;

/// Apply a point delta to a child's ledger, at most once per reference
pub async fn award_points(
    State(state): State<AppState>,
    Json(request): Json<AwardPointsRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/points/award - child: {}, delta: {}",
        request.child_id, request.delta
    );

    match state.award_service.award_points(request).await {
        Ok(response) if response.awarded => {
            (StatusCode::CREATED, Json(response)).into_response()
        }
        // Duplicate reference: nothing written, still a success
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to award points: {}", e);
            points_error_response(&e).into_response()
        }
    }
}
