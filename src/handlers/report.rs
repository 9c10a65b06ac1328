use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Local;
use tracing::instrument;

use crate::billing::period::PeriodSelection;
use crate::dtos::period::{PeriodRequest, PeriodResponse};
use crate::dtos::report::{BillTotals, CustomerBillLine, CustomerBillsResponse, SendBillRequest, SendBillResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::{customer, dairy_info, statement};
use crate::notify::{dispatch, BillNotice};
use crate::state::AppState;

/// Resolves a period picker selection without touching any data.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn resolve_period(
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PeriodRequest>,
) -> Result<Json<PeriodResponse>, AppError> {
    let selection = req.selection()?;
    let range = selection.resolve()?;
    Ok(Json(PeriodResponse::new(selection.kind(), range)))
}

/// Bill, pending and total due for every customer over the period. Archived
/// customers only appear while they still have something to settle.
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn customer_bills(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PeriodRequest>,
) -> Result<Json<CustomerBillsResponse>, AppError> {
    let selection = req.selection()?;
    let range = selection.resolve()?;

    let mut conn = db_pool.acquire().await?;
    let customers = customer::list_all(&mut conn, auth.user_id).await?;
    let statements = statement::build(&mut conn, auth.user_id, range, customers).await?;

    let customers: Vec<CustomerBillLine> = statements
        .into_iter()
        .filter(|s| !s.customer.is_archived() || !s.figures.is_zero())
        .map(CustomerBillLine::from)
        .collect();
    let totals: BillTotals = customers.iter().collect();

    Ok(Json(CustomerBillsResponse {
        period: PeriodResponse::new(selection.kind(), range),
        customers,
        totals,
    }))
}

/// Hands one customer's bill to the notifier. A failed hand-off is reported
/// in the response, not as an error.
#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = customer_id))]
pub async fn send_bill_notice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<i64>,
    body: Option<Json<SendBillRequest>>,
) -> Result<Json<SendBillResponse>, AppError> {
    let picked = body.and_then(|Json(req)| req.selection);
    let selection = match &picked {
        Some(picked) => picked.selection()?,
        None => PeriodSelection::previous_month(Local::now().date_naive()),
    };
    let range = selection.resolve()?;

    let mut conn = state.db_pool.acquire().await?;

    let found = customer::find_owned(&mut conn, auth.user_id, customer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;
    let whatsapp_no = found
        .whatsapp_no
        .clone()
        .ok_or_else(|| AppError::validation("Customer has no WhatsApp number"))?;

    let statement = statement::build_one(&mut conn, auth.user_id, range, found).await?;
    let dairy_name = dairy_info::find(&mut conn, auth.user_id).await?.map(|d| d.dairy_name);

    let notice = BillNotice {
        dairy_name,
        customer_id,
        customer_name: statement.customer.customer_name.clone(),
        whatsapp_no,
        period: range,
        figures: statement.figures,
    };
    let delivered = dispatch(state.notifier.as_ref(), &notice);

    Ok(Json(SendBillResponse {
        customer_id,
        period: range,
        figures: statement.figures,
        overlapping_payments: statement.overlapping_payments,
        delivered,
    }))
}
