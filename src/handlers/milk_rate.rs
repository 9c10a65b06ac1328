use axum::extract::State;
use axum::{Extension, Json};
use tracing::instrument;

use crate::dtos::milk_rate::{MilkRatesRequest, MilkRatesResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::milk_rate;
use crate::state::AppState;

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn get_milk_rates(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MilkRatesResponse>, AppError> {
    let mut conn = db_pool.acquire().await?;
    let master = milk_rate::find(&mut conn, auth.user_id).await?;

    Ok(Json(match master {
        Some(m) => MilkRatesResponse {
            cow_rate: Some(m.cow_rate),
            buffalo_rate: Some(m.buffalo_rate),
            updated_at: Some(m.updated_at),
        },
        None => MilkRatesResponse { cow_rate: None, buffalo_rate: None, updated_at: None },
    }))
}

/// Takes effect on every bill computed afterwards, past periods included.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn update_milk_rates(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<MilkRatesRequest>,
) -> Result<Json<MilkRatesResponse>, AppError> {
    let rates = req.validate()?;

    let mut conn = db_pool.acquire().await?;
    let saved = milk_rate::upsert(&mut conn, auth.user_id, &rates).await?;

    tracing::info!(cow_rate = saved.cow_rate, buffalo_rate = saved.buffalo_rate, "Master rates updated");

    Ok(Json(MilkRatesResponse {
        cow_rate: Some(saved.cow_rate),
        buffalo_rate: Some(saved.buffalo_rate),
        updated_at: Some(saved.updated_at),
    }))
}
