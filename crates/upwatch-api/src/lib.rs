//! upwatch-api — HTTP surface for upwatch.
//!
//! Serves the dashboard, the form endpoints that edit the registry, the
//! `/check` trigger and a small read-only JSON API.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Dashboard |
//! | GET/POST | `/add` | Register a service (`url`, `healthstring`) |
//! | GET/POST | `/delete` | Delete a service (`key`) |
//! | GET/POST | `/enable`, `/disable` | Toggle checks for a service (`key`) |
//! | GET/POST | `/addaddr` | Register a notification address (`addr`) |
//! | GET/POST | `/deladdr` | Delete an address (`key`) |
//! | GET/POST | `/check` | Run one check cycle, plain-text report |
//! | GET | `/api/v1/services` | List services |
//! | GET | `/api/v1/addresses` | List addresses |
//! | POST | `/api/v1/check` | Run one check cycle, JSON summary |
//! | GET | `/healthz` | Liveness |
//!
//! Form endpoints read their fields from the query string on GET and from
//! an urlencoded body on POST, then redirect to the dashboard.

pub mod dashboard;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use upwatch_health::CycleRunner;
use upwatch_state::StateStore;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub runner: Arc<CycleRunner>,
}

/// Build the complete router (dashboard + forms + JSON API).
pub fn build_router(store: StateStore, runner: Arc<CycleRunner>) -> Router {
    let state = ApiState { store, runner };

    let api_routes = Router::new()
        .route("/services", get(handlers::list_services))
        .route("/addresses", get(handlers::list_addresses))
        .route("/check", axum::routing::post(handlers::run_check_json));

    Router::new()
        .route("/", get(dashboard::index))
        .route("/add", get(handlers::add_service).post(handlers::add_service))
        .route("/delete", get(handlers::delete_service).post(handlers::delete_service))
        .route("/enable", get(handlers::enable_service).post(handlers::enable_service))
        .route("/disable", get(handlers::disable_service).post(handlers::disable_service))
        .route("/addaddr", get(handlers::add_address).post(handlers::add_address))
        .route("/deladdr", get(handlers::delete_address).post(handlers::delete_address))
        .route("/check", get(handlers::run_check).post(handlers::run_check))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes)
        .with_state(state)
}
