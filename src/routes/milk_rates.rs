use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::milk_rate;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/milk-rates", get(milk_rate::get_milk_rates).put(milk_rate::update_milk_rates))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
