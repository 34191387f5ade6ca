//! Dashboard page.

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use upwatch_state::{AddressRecord, ServiceRecord};

use crate::ApiState;

fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    services: Vec<ServiceRecord>,
    addresses: Vec<AddressRecord>,
    down: usize,
}

/// GET /
pub async fn index(State(state): State<ApiState>) -> Response {
    let listing = state
        .store
        .list_services()
        .and_then(|services| Ok((services, state.store.list_addresses()?)));

    match listing {
        Ok((services, addresses)) => {
            let down = services
                .iter()
                .filter(|r| r.service.enabled && !r.service.up)
                .count();
            render(IndexTemplate {
                services,
                addresses,
                down,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "could not load dashboard");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
