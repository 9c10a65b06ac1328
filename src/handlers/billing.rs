use axum::extract::{Query, State};
use axum::{Extension, Json};
use http::StatusCode;
use tracing::instrument;

use crate::billing::period::DateRange;
use crate::billing::reconcile::{confirm_shown, pending_after};
use crate::billing::{fits_column, MAX_AMOUNT};
use crate::dtos::billing::{ListPaymentsQuery, PaymentResponse, SaveBillPaymentRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::bill_payment::{self, NewPayment};
use crate::models::{customer, statement};
use crate::state::AppState;

/// Records a payment against the bill the operator was shown.
///
/// The customer row stays locked from the re-computation to the commit, so
/// two saves for one customer serialize; the second sees the new pending and
/// fails with a conflict instead of overwriting it.
#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = req.customer_id))]
pub async fn save_bill_payment(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveBillPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let period = DateRange::new(req.period_start_date, req.period_end_date)?;
    if !fits_column(req.current_bill, MAX_AMOUNT) || !fits_column(req.previous_pending, MAX_AMOUNT) {
        return Err(AppError::validation("Bill figures must be amounts with at most two decimals"));
    }
    pending_after(req.current_bill, req.previous_pending, req.amount_paid)?;

    let mut tx = db_pool.begin().await?;

    let locked = customer::find_owned_for_update(&mut *tx, auth.user_id, req.customer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    let statement = statement::build_one(&mut *tx, auth.user_id, period, locked).await?;
    let figures = statement.figures;

    confirm_shown(req.current_bill, req.previous_pending, &figures)
        .map_err(|stale| AppError::conflict(stale.to_string()))?;

    let pending = pending_after(figures.current_bill, figures.pending_amount, req.amount_paid)?;

    let payment = bill_payment::insert(
        &mut *tx,
        &NewPayment {
            customer_id: req.customer_id,
            current_bill: figures.current_bill,
            previous_pending: figures.pending_amount,
            amount_paid: req.amount_paid,
            pending_after: pending,
            billing_period: req.billing_period,
            period,
        },
    )
    .await?;

    sqlx::query("UPDATE customers SET pending_amount = $2::FLOAT8 WHERE id = $1")
        .bind(req.customer_id)
        .bind(pending)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        payment_id = payment.id,
        current_bill = payment.current_bill,
        amount_paid = payment.amount_paid,
        pending_after = payment.pending_after,
        "Bill payment saved"
    );

    Ok((StatusCode::CREATED, Json(payment.into())))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_bill_payments(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        DateRange::new(start, end)?;
    }

    let mut conn = db_pool.acquire().await?;

    if let Some(customer_id) = query.customer_id {
        customer::find_owned(&mut conn, auth.user_id, customer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;
    }

    let payments =
        bill_payment::list(&mut conn, auth.user_id, query.customer_id, query.start_date, query.end_date).await?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}
