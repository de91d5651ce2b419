//! # REST API for Wallets
//!
//! Endpoints for wallet summaries, reserved points, earnings breakdowns and
//! identifier resolution.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info};

use crate::io::rest::points_error_response;
use crate::AppState;
use shared::{BreakdownResponse, FamilyWalletsResponse, ReservedPointsResponse, WalletResponse};

/// Get the canonical wallet for a child (either id form)
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/wallet", child_id);

    match state.wallet_service.fetch_wallet(&child_id).await {
        Ok(wallet) => (StatusCode::OK, Json(WalletResponse { child_id, wallet })).into_response(),
        Err(e) => {
            error!("Failed to fetch wallet for {}: {}", child_id, e);
            points_error_response(&e).into_response()
        }
    }
}

/// Get the points reserved against accepted reward offers
pub async fn get_reserved_points(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/wallet/reserved", child_id);

    match state.reward_service.fetch_reserved_points(&child_id).await {
        Ok(reserved_points) => (
            StatusCode::OK,
            Json(ReservedPointsResponse {
                child_id,
                reserved_points,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch reserved points for {}: {}", child_id, e);
            points_error_response(&e).into_response()
        }
    }
}

/// Get the categorized earnings breakdown
pub async fn get_earnings_breakdown(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/wallet/breakdown", child_id);

    match state
        .breakdown_service
        .fetch_earnings_breakdown(&child_id)
        .await
    {
        Ok(breakdown) => (
            StatusCode::OK,
            Json(BreakdownResponse {
                child_id,
                breakdown,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch breakdown for {}: {}", child_id, e);
            points_error_response(&e).into_response()
        }
    }
}

/// Resolve an id that may be either form into the canonical/legacy pair
pub async fn resolve_identifiers(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/identifiers", child_id);

    match state.identity_service.resolve_identifiers(&child_id).await {
        Ok(identifiers) => (StatusCode::OK, Json(identifiers)).into_response(),
        Err(e) => {
            error!("Failed to resolve identifiers for {}: {}", child_id, e);
            points_error_response(&e).into_response()
        }
    }
}

/// Wallets for every child of a family
pub async fn get_family_wallets(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/families/{}/wallets", family_id);

    match state.wallet_service.family_wallets(&family_id).await {
        Ok(wallets) => (StatusCode::OK, Json(FamilyWalletsResponse { wallets })).into_response(),
        Err(e) => {
            error!("Failed to fetch family wallets for {}: {}", family_id, e);
            points_error_response(&e).into_response()
        }
    }
}
