use axum::{
    routing::{get, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::dashboard;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", post(dashboard::dashboard_summary))
        .route("/dashboard/monthly-sold-milk", get(dashboard::monthly_sold_milk))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
