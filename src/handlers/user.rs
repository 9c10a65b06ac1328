use axum::extract::Extension;
use axum::{extract::State, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use http::StatusCode;
use tracing::instrument;

use crate::auth::jwt::sign_token;
use crate::dtos::user::{LoginRequest, LoginResponse, RegisterUserRequest, UserResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::milk_rate;
use crate::models::user::User;
use crate::state::AppState;

const USER_COLUMNS: &str = "id, username, password_hash, is_active, created_at";

/// Creates the tenant and seeds its master rates from the configured defaults.
#[instrument(skip_all, fields(username = %payload.username))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.len() < 6 {
        return Err(AppError::validation("Password too short"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let mut tx = state.db_pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::conflict("Username already exists");
            }
        }
        AppError::db(e)
    })?;

    milk_rate::upsert(&mut *tx, user.id, &state.config.default_rates).await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            is_active: user.is_active,
            created_at: user.created_at,
        }),
    ))
}

#[instrument(skip_all, fields(username = %payload.username))]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
        .bind(payload.username.trim())
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    let ttl_hours = state.config.token_ttl_hours;
    let token = sign_token(user.id, &user.username, &state.config.jwt_secret, ttl_hours)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: ttl_hours * 60 * 60,
    }))
}

#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(auth.user_id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        is_active: user.is_active,
        created_at: user.created_at,
    }))
}
