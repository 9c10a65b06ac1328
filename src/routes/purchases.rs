use axum::{
    routing::{get, post, put},
    Router,
};
use crate::state::AppState;
use crate::handlers::purchase;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/purchases", post(purchase::create_purchase))
        .route("/purchases/recent", get(purchase::recent_purchases))
        .route("/purchases/{id}", put(purchase::update_purchase).delete(purchase::delete_purchase))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
