use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{Days, Local};
use http::StatusCode;
use tracing::instrument;

use crate::dtos::purchase::{PurchaseRequest, PurchaseResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::purchase::{PurchaseEntry, PURCHASE_COLUMNS};
use crate::state::AppState;

const RECENT_DAYS: u64 = 5;

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    req.validate(Local::now().date_naive())?;

    let created = sqlx::query_as::<_, PurchaseEntry>(&format!(
        "INSERT INTO purchase_entries (user_id, milk_type, purchase_qty_liters, purchase_rate, entry_date)
         VALUES ($1, $2, $3::FLOAT8, $4::FLOAT8, $5)
         RETURNING {PURCHASE_COLUMNS}"
    ))
    .bind(auth.user_id)
    .bind(req.milk_type)
    .bind(req.purchase_qty_liters)
    .bind(req.purchase_rate)
    .bind(req.entry_date)
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[instrument(skip_all, fields(user_id = auth.user_id, purchase_id = id))]
pub async fn update_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    req.validate(Local::now().date_naive())?;

    let updated = sqlx::query_as::<_, PurchaseEntry>(&format!(
        "UPDATE purchase_entries
         SET milk_type = $3, purchase_qty_liters = $4::FLOAT8, purchase_rate = $5::FLOAT8, entry_date = $6
         WHERE id = $1 AND user_id = $2
         RETURNING {PURCHASE_COLUMNS}"
    ))
    .bind(id)
    .bind(auth.user_id)
    .bind(req.milk_type)
    .bind(req.purchase_qty_liters)
    .bind(req.purchase_rate)
    .bind(req.entry_date)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase entry not found"))?;

    Ok(Json(updated.into()))
}

#[instrument(skip_all, fields(user_id = auth.user_id, purchase_id = id))]
pub async fn delete_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM purchase_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Purchase entry not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Purchases dated within the last five days, today included.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn recent_purchases(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<PurchaseResponse>>, AppError> {
    let today = Local::now().date_naive();
    let since = today
        .checked_sub_days(Days::new(RECENT_DAYS - 1))
        .ok_or_else(|| AppError::internal("date out of range"))?;

    let rows = sqlx::query_as::<_, PurchaseEntry>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchase_entries
         WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
         ORDER BY entry_date DESC, id DESC"
    ))
    .bind(auth.user_id)
    .bind(since)
    .bind(today)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(PurchaseResponse::from).collect()))
}
