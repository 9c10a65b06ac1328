use axum::{
    routing::{get, put},
    Router,
};
use crate::state::AppState;
use crate::handlers::customer;
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/customers", get(customer::list_customers).post(customer::create_customer))
        .route("/customers/{id}", put(customer::update_customer).delete(customer::delete_customer))
        .route(
            "/customers/{id}/balance-audit",
            get(customer::audit_balance).post(customer::repair_balance),
        )
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
}
