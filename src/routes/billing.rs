use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::billing;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/billing/payments",
            get(billing::list_bill_payments).post(billing::save_bill_payment),
        )
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
