pub mod billing;
pub mod customers;
pub mod daily_entries;
pub mod dairy_info;
pub mod dashboard;
pub mod milk_rates;
pub mod purchases;
pub mod reports;
pub mod users;

#[cfg(test)]
mod flows;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const BASE_PATH: &str = "/milk-billing";

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes(state))
        .merge(customers::routes(state))
        .merge(milk_rates::routes(state))
        .merge(daily_entries::routes(state))
        .merge(reports::routes(state))
        .merge(billing::routes(state))
        .merge(purchases::routes(state))
        .merge(dashboard::routes(state))
        .merge(dairy_info::routes(state))
}

/// The whole service under [`BASE_PATH`], ready to serve.
pub fn app(state: AppState) -> Router {
    let api = create_router(&state)
        .route("/", get(|| async { "Milk billing API" }))
        .route("/health", get(health_check));

    Router::new()
        .nest(BASE_PATH, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
