use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::billing::period::{BillingPeriod, DateRange};
use crate::billing::reconcile::LedgerDelta;
use crate::billing::round_currency;

const PAYMENT_COLUMNS: &str = r#"
    p.id, p.customer_id,
    (p.current_bill)::FLOAT8 AS current_bill,
    (p.previous_pending)::FLOAT8 AS previous_pending,
    (p.amount_paid)::FLOAT8 AS amount_paid,
    (p.pending_after)::FLOAT8 AS pending_after,
    p.billing_period, p.period_start_date, p.period_end_date, p.created_at
"#;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillPayment {
    pub id: i64,
    pub customer_id: i64,
    pub current_bill: f64,
    pub previous_pending: f64,
    pub amount_paid: f64,
    pub pending_after: f64,
    pub billing_period: BillingPeriod,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewPayment {
    pub customer_id: i64,
    pub current_bill: f64,
    pub previous_pending: f64,
    pub amount_paid: f64,
    pub pending_after: f64,
    pub billing_period: BillingPeriod,
    pub period: DateRange,
}

#[derive(Debug, FromRow)]
struct BilledRow {
    customer_id: i64,
    billed: f64,
}

#[derive(Debug, FromRow)]
struct StraddleRow {
    customer_id: i64,
    payments: i64,
}

pub async fn insert(conn: &mut PgConnection, payment: &NewPayment) -> Result<BillPayment, sqlx::Error> {
    let sql = format!(
        "WITH p AS (
             INSERT INTO bill_payments
                 (customer_id, current_bill, previous_pending, amount_paid, pending_after,
                  billing_period, period_start_date, period_end_date)
             VALUES ($1, $2::FLOAT8, $3::FLOAT8, $4::FLOAT8, $5::FLOAT8, $6, $7, $8)
             RETURNING *
         )
         SELECT {PAYMENT_COLUMNS} FROM p"
    );
    sqlx::query_as::<_, BillPayment>(&sql)
        .bind(payment.customer_id)
        .bind(payment.current_bill)
        .bind(payment.previous_pending)
        .bind(payment.amount_paid)
        .bind(payment.pending_after)
        .bind(payment.billing_period)
        .bind(payment.period.start_date)
        .bind(payment.period.end_date)
        .fetch_one(conn)
        .await
}

/// Newest first. Date bounds keep payments whose period overlaps them.
pub async fn list(
    conn: &mut PgConnection,
    user_id: i64,
    customer_id: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<BillPayment>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}
         FROM bill_payments p
         JOIN customers c ON c.id = p.customer_id
         WHERE c.user_id = $1
           AND ($2::BIGINT IS NULL OR p.customer_id = $2)
           AND ($3::DATE IS NULL OR p.period_end_date >= $3)
           AND ($4::DATE IS NULL OR p.period_start_date <= $4)
         ORDER BY p.created_at DESC, p.id DESC"
    );
    sqlx::query_as::<_, BillPayment>(&sql)
        .bind(user_id)
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(conn)
        .await
}

/// Bill amounts already folded into pending by payments for periods lying
/// inside `range`, per customer.
pub async fn billed_within(
    conn: &mut PgConnection,
    user_id: i64,
    range: DateRange,
    only: Option<i64>,
) -> Result<HashMap<i64, f64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BilledRow>(
        r#"SELECT p.customer_id, (SUM(p.current_bill))::FLOAT8 AS billed
           FROM bill_payments p
           JOIN customers c ON c.id = p.customer_id
           WHERE c.user_id = $1
             AND p.period_start_date >= $2
             AND p.period_end_date <= $3
             AND ($4::BIGINT IS NULL OR p.customer_id = $4)
           GROUP BY p.customer_id"#,
    )
    .bind(user_id)
    .bind(range.start_date)
    .bind(range.end_date)
    .bind(only)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|r| (r.customer_id, round_currency(r.billed))).collect())
}

/// Payments whose period overlaps `range` without lying inside it, per
/// customer. Their bills are not subtracted from a report over `range`.
pub async fn straddling(
    conn: &mut PgConnection,
    user_id: i64,
    range: DateRange,
    only: Option<i64>,
) -> Result<HashMap<i64, i64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StraddleRow>(
        r#"SELECT p.customer_id, COUNT(*) AS payments
           FROM bill_payments p
           JOIN customers c ON c.id = p.customer_id
           WHERE c.user_id = $1
             AND p.period_start_date <= $3
             AND p.period_end_date >= $2
             AND (p.period_start_date < $2 OR p.period_end_date > $3)
             AND ($4::BIGINT IS NULL OR p.customer_id = $4)
           GROUP BY p.customer_id"#,
    )
    .bind(user_id)
    .bind(range.start_date)
    .bind(range.end_date)
    .bind(only)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|r| (r.customer_id, r.payments)).collect())
}

/// Every payment of the customer, oldest first.
pub async fn history(conn: &mut PgConnection, customer_id: i64) -> Result<Vec<LedgerDelta>, sqlx::Error> {
    sqlx::query_as::<_, LedgerDelta>(
        r#"SELECT (current_bill)::FLOAT8 AS current_bill, (amount_paid)::FLOAT8 AS amount_paid
           FROM bill_payments
           WHERE customer_id = $1
           ORDER BY created_at, id"#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await
}
