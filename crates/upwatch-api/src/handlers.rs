//! Form, check and JSON API handlers.
//!
//! Form handlers mutate the registry through `StateStore` and redirect back
//! to the dashboard. None of them touch the `up` flag.

use axum::Json;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info};

use upwatch_health::CycleError;
use upwatch_state::{StateError, StateResult};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// 302 back to the dashboard.
fn back_to_dashboard() -> Response {
    (StatusCode::FOUND, [(LOCATION, "/")]).into_response()
}

fn plain(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// Map a registry write to a redirect, or a plain-text error page.
fn redirect_or_error<T>(result: StateResult<T>) -> Response {
    match result {
        Ok(_) => back_to_dashboard(),
        Err(e @ StateError::NotFound { .. }) => plain(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => {
            error!(error = %e, "registry write failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ── Services ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AddServiceForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub healthstring: String,
}

/// GET|POST /add
pub async fn add_service(
    State(state): State<ApiState>,
    Form(form): Form<AddServiceForm>,
) -> Response {
    let url = form.url.trim();
    if url.is_empty() {
        return plain(StatusCode::BAD_REQUEST, "url is required");
    }
    if let Err(e) = upwatch_health::validate_url(url) {
        return plain(StatusCode::BAD_REQUEST, e);
    }
    let result = state.store.create_service(url, &form.healthstring);
    if let Ok(key) = &result {
        info!(%key, %url, "service added");
    }
    redirect_or_error(result)
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyForm {
    #[serde(default)]
    pub key: String,
}

/// GET|POST /delete
///
/// Deleting an unknown key is not an error.
pub async fn delete_service(State(state): State<ApiState>, Form(form): Form<KeyForm>) -> Response {
    redirect_or_error(state.store.delete_service(&form.key))
}

/// GET|POST /enable
pub async fn enable_service(State(state): State<ApiState>, Form(form): Form<KeyForm>) -> Response {
    redirect_or_error(state.store.set_service_enabled(&form.key, true))
}

/// GET|POST /disable
pub async fn disable_service(
    State(state): State<ApiState>,
    Form(form): Form<KeyForm>,
) -> Response {
    redirect_or_error(state.store.set_service_enabled(&form.key, false))
}

// ── Addresses ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AddAddressForm {
    #[serde(default)]
    pub addr: String,
}

/// GET|POST /addaddr
pub async fn add_address(
    State(state): State<ApiState>,
    Form(form): Form<AddAddressForm>,
) -> Response {
    let addr = form.addr.trim();
    if addr.is_empty() {
        return plain(StatusCode::BAD_REQUEST, "addr is required");
    }
    redirect_or_error(state.store.create_address(addr))
}

/// GET|POST /deladdr
pub async fn delete_address(State(state): State<ApiState>, Form(form): Form<KeyForm>) -> Response {
    redirect_or_error(state.store.delete_address(&form.key))
}

// ── Check ──────────────────────────────────────────────────────

fn cycle_status(e: &CycleError) -> StatusCode {
    match e {
        CycleError::AlreadyRunning => StatusCode::CONFLICT,
        CycleError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET|POST /check
///
/// Runs one cycle and answers with one line per problem, then `Done!`.
pub async fn run_check(State(state): State<ApiState>) -> Response {
    match state.runner.run_cycle().await {
        Ok(summary) => plain(StatusCode::OK, summary.text_report()),
        Err(e) => {
            error!(error = %e, "check cycle failed");
            plain(cycle_status(&e), e.to_string())
        }
    }
}

/// POST /api/v1/check
pub async fn run_check_json(State(state): State<ApiState>) -> Response {
    match state.runner.run_cycle().await {
        Ok(summary) => ApiResponse::ok(summary).into_response(),
        Err(e) => error_response(&e.to_string(), cycle_status(&e)),
    }
}

// ── Listing ────────────────────────────────────────────────────

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> Response {
    match state.store.list_services() {
        Ok(services) => ApiResponse::ok(services).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/v1/addresses
pub async fn list_addresses(State(state): State<ApiState>) -> Response {
    match state.store.list_addresses() {
        Ok(addresses) => ApiResponse::ok(addresses).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
