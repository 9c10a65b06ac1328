use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::daily_entry;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/daily-entries",
            get(daily_entry::get_daily_entries).put(daily_entry::save_daily_entries),
        )
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
