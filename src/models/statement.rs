//! Per-customer bill figures for a period, assembled from stored rows.

use sqlx::PgConnection;

use super::customer::Customer;
use super::{bill_payment, daily_entry, milk_rate};
use crate::billing::bill::{compute_bill, BillFigures, VolumeTally};
use crate::billing::period::DateRange;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Statement {
    pub customer: Customer,
    pub tally: VolumeTally,
    pub figures: BillFigures,
    /// Payments only partly inside the range; their liters may already be
    /// billed and are not subtracted.
    pub overlapping_payments: i64,
}

/// Bills every given customer for `range` with the current rates. A missing
/// rate for any delivered milk type fails the whole call.
pub async fn build(
    conn: &mut PgConnection,
    user_id: i64,
    range: DateRange,
    customers: Vec<Customer>,
) -> Result<Vec<Statement>, AppError> {
    let only = match customers.as_slice() {
        [single] => Some(single.id),
        _ => None,
    };
    let master = milk_rate::master_rates(&mut *conn, user_id).await?;
    let volumes = daily_entry::volumes(&mut *conn, user_id, range, only).await?;
    let billed = bill_payment::billed_within(&mut *conn, user_id, range, only).await?;
    let straddling = bill_payment::straddling(&mut *conn, user_id, range, only).await?;

    customers
        .into_iter()
        .map(|customer| -> Result<Statement, AppError> {
            let tally = volumes.get(&customer.id).copied().unwrap_or_default();
            let gross_bill = compute_bill(&customer.rates(), &master, &tally)?;
            let already_billed = billed.get(&customer.id).copied().unwrap_or(0.0);
            let figures = BillFigures::new(gross_bill, already_billed, customer.pending_amount);
            let overlapping_payments = straddling.get(&customer.id).copied().unwrap_or(0);
            if overlapping_payments > 0 {
                tracing::warn!(
                    customer_id = customer.id,
                    overlapping_payments,
                    "Payments straddle the report range; their bills are not subtracted"
                );
            }
            Ok(Statement { customer, tally, figures, overlapping_payments })
        })
        .collect()
}

pub async fn build_one(
    conn: &mut PgConnection,
    user_id: i64,
    range: DateRange,
    customer: Customer,
) -> Result<Statement, AppError> {
    build(conn, user_id, range, vec![customer])
        .await?
        .pop()
        .ok_or_else(|| AppError::internal("statement missing for customer"))
}
