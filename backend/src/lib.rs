//! # Points Tracker Backend
//!
//! Backend for the household points tracker: parents define targets and
//! rewards, children earn points, and the wallet reconciliation engine keeps
//! the totals honest across the precomputed rollup, the raw ledgers and the
//! accepted reward offers.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (services, reconciliation logic)
//!     ↓
//! Storage Layer (store traits, SQLite repositories)
//! ```

pub mod domain;
pub mod events;
pub mod io;
pub mod storage;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use anyhow::Result;
use log::info;

use crate::domain::{
    AwardService, BreakdownService, ChildService, IdentityService, RewardService, WalletService,
};
use crate::events::PointsEvents;
use crate::storage::sqlite::{
    AwardRepository, ChildRepository, DbConnection, LedgerRepository, OfferRepository,
    RewardRepository, RollupRepository,
};
use crate::storage::traits::{
    AwardStore, ChildStore, LedgerStore, OfferStore, RewardCatalogStore, RollupStore,
};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService,
    pub identity_service: IdentityService,
    pub wallet_service: WalletService,
    pub reward_service: RewardService,
    pub breakdown_service: BreakdownService,
    pub award_service: AwardService,
    pub events: PointsEvents,
}

/// Build the application state over an existing database connection
pub fn build_state(db: DbConnection) -> AppState {
    let child_store: Arc<dyn ChildStore> = Arc::new(ChildRepository::new(db.clone()));
    let ledger_store: Arc<dyn LedgerStore> = Arc::new(LedgerRepository::new(db.clone()));
    let offer_store: Arc<dyn OfferStore> = Arc::new(OfferRepository::new(db.clone()));
    let catalog_store: Arc<dyn RewardCatalogStore> = Arc::new(RewardRepository::new(db.clone()));
    let rollup_store: Arc<dyn RollupStore> = Arc::new(RollupRepository::new(db.clone()));
    let award_store: Arc<dyn AwardStore> = Arc::new(AwardRepository::new(db));

    let events = PointsEvents::new();
    let identity_service = IdentityService::new(child_store.clone());
    let reward_service = RewardService::new(
        offer_store,
        catalog_store,
        rollup_store.clone(),
        identity_service.clone(),
    );
    let wallet_service = WalletService::new(
        rollup_store,
        ledger_store.clone(),
        child_store.clone(),
        reward_service.clone(),
        identity_service.clone(),
    );
    let breakdown_service = BreakdownService::new(ledger_store.clone(), identity_service.clone());
    let award_service = AwardService::new(
        award_store,
        ledger_store,
        identity_service.clone(),
        events.clone(),
    );
    let child_service = ChildService::new(child_store);

    AppState {
        child_service,
        identity_service,
        wallet_service,
        reward_service,
        breakdown_service,
        award_service,
        events,
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend() -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::init().await?;

    info!("Setting up application state");
    Ok(build_state(db))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .route("/children", post(io::create_child))
        .route("/children/:id", get(io::get_child).put(io::update_child))
        .route("/children/:id/identifiers", get(io::resolve_identifiers))
        .route("/children/:id/wallet", get(io::get_wallet))
        .route("/children/:id/wallet/reserved", get(io::get_reserved_points))
        .route("/children/:id/wallet/breakdown", get(io::get_earnings_breakdown))
        .route("/families/:id/children", get(io::list_family_children))
        .route("/families/:id/wallets", get(io::get_family_wallets))
        .route("/points/award", post(io::award_points));

    // Define our main application router
    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
