use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Local;
use tracing::instrument;

use crate::billing::daily::{DayRecord, RosterCustomer};
use crate::dtos::daily_entry::{DailyEntriesResponse, DailyEntryQuery, SaveDailyEntriesRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::{customer, daily_entry};
use crate::state::AppState;

#[instrument(skip_all, fields(user_id = auth.user_id, entry_date = %query.entry_date))]
pub async fn get_daily_entries(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DailyEntryQuery>,
) -> Result<Json<DailyEntriesResponse>, AppError> {
    let mut conn = db_pool.acquire().await?;

    let roster: Vec<RosterCustomer> = customer::list_active(&mut conn, auth.user_id)
        .await?
        .iter()
        .map(|c| c.roster_entry())
        .collect();

    let flag = daily_entry::day_flag(&mut conn, auth.user_id, query.entry_date).await?;
    let rows = match flag {
        Some(false) => daily_entry::entries_on(&mut conn, auth.user_id, query.entry_date).await?,
        _ => Vec::new(),
    };
    let record = DayRecord::from_stored(flag, &rows);

    Ok(Json(DailyEntriesResponse {
        entry_date: query.entry_date,
        is_holiday: record.is_holiday(),
        recorded: record.is_recorded(),
        entries: record.sheet(&roster),
    }))
}

/// Replaces the whole day. Saving the same sheet twice leaves the same rows.
#[instrument(skip_all, fields(user_id = auth.user_id, entry_date = %req.entry_date))]
pub async fn save_daily_entries(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveDailyEntriesRequest>,
) -> Result<Json<DailyEntriesResponse>, AppError> {
    if req.entry_date > Local::now().date_naive() {
        return Err(AppError::validation("Entry date cannot be in the future"));
    }
    let record = DayRecord::from_submission(req.is_holiday, &req.entries)?;

    let mut tx = db_pool.begin().await?;

    let roster: Vec<RosterCustomer> = customer::list_active(&mut *tx, auth.user_id)
        .await?
        .iter()
        .map(|c| c.roster_entry())
        .collect();

    if let Some(unknown) = record
        .customer_ids()
        .into_iter()
        .find(|id| !roster.iter().any(|c| c.customer_id == *id))
    {
        return Err(AppError::not_found(format!("Customer {unknown} not found")));
    }

    let rows = record.rows_to_store(&roster);
    daily_entry::replace_day(&mut *tx, auth.user_id, req.entry_date, record.is_holiday(), &rows).await?;

    tx.commit().await?;

    tracing::info!(rows = rows.len(), is_holiday = record.is_holiday(), "Daily entries saved");

    let saved = DayRecord::from_stored(Some(record.is_holiday()), &rows);
    Ok(Json(DailyEntriesResponse {
        entry_date: req.entry_date,
        is_holiday: saved.is_holiday(),
        recorded: true,
        entries: saved.sheet(&roster),
    }))
}
