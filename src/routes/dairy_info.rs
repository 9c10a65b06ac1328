use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::dairy_info;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dairy-info", get(dairy_info::get_dairy_info).put(dairy_info::update_dairy_info))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
