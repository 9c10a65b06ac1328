use axum::body::Body;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use http::{header, Request};

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::state::AppState;

/// The verified caller. Handlers scope every read and write by `user_id`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

    // Expect "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization format"))?;

    let claims = verify_token(token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
