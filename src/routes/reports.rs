use axum::{routing::post, Router};
use crate::state::AppState;
use crate::handlers::report;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/periods/resolve", post(report::resolve_period))
        .route("/reports/customer-bills", post(report::customer_bills))
        .route("/reports/customer-bills/{customer_id}/send", post(report::send_bill_notice))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
