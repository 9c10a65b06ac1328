use axum::extract::{Query, State};
use axum::{Extension, Json};
use tracing::instrument;

use crate::billing::bill::price_by_type;
use crate::billing::dashboard::{monthly_series, DashboardSummary, MilkFigures};
use crate::dtos::dashboard::{DashboardResponse, MonthlySoldMilkQuery, MonthlySoldMilkResponse};
use crate::dtos::period::{PeriodRequest, PeriodResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::{customer, daily_entry, milk_rate, purchase};
use crate::state::AppState;

/// Purchased against sold milk for the period. Sales are priced the same way
/// bills are, so a missing rate fails the summary.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn dashboard_summary(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PeriodRequest>,
) -> Result<Json<DashboardResponse>, AppError> {
    let selection = req.selection()?;
    let range = selection.resolve()?;

    let mut conn = db_pool.acquire().await?;

    let purchased = purchase::totals(&mut conn, auth.user_id, range).await?;

    let master = milk_rate::master_rates(&mut conn, auth.user_id).await?;
    let customers = customer::list_all(&mut conn, auth.user_id).await?;
    let volumes = daily_entry::volumes(&mut conn, auth.user_id, range, None).await?;

    let mut sold = MilkFigures::default();
    for c in &customers {
        let Some(tally) = volumes.get(&c.id) else { continue };
        for (milk_type, amount) in price_by_type(&c.rates(), &master, tally)? {
            sold.add(milk_type, tally.liters(milk_type), amount);
        }
    }

    Ok(Json(DashboardResponse {
        period: PeriodResponse::new(selection.kind(), range),
        summary: DashboardSummary::new(purchased, sold),
    }))
}

#[instrument(skip_all, fields(user_id = auth.user_id, year = query.year))]
pub async fn monthly_sold_milk(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MonthlySoldMilkQuery>,
) -> Result<Json<MonthlySoldMilkResponse>, AppError> {
    let mut conn = db_pool.acquire().await?;
    let rows = daily_entry::sold_by_month(&mut conn, auth.user_id, query.year).await?;

    Ok(Json(MonthlySoldMilkResponse { year: query.year, months: monthly_series(rows) }))
}
