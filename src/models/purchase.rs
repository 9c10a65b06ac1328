use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::billing::dashboard::MilkFigures;
use crate::billing::period::DateRange;
use crate::billing::MilkType;

pub const PURCHASE_COLUMNS: &str = r#"
    id, milk_type,
    (purchase_qty_liters)::FLOAT8 AS purchase_qty_liters,
    (purchase_rate)::FLOAT8 AS purchase_rate,
    entry_date, created_at
"#;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseEntry {
    pub id: i64,
    pub milk_type: MilkType,
    pub purchase_qty_liters: f64,
    pub purchase_rate: f64,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl PurchaseEntry {
    pub fn amount(&self) -> f64 {
        self.purchase_qty_liters * self.purchase_rate
    }
}

#[derive(Debug, FromRow)]
struct PurchaseTotalRow {
    milk_type: MilkType,
    liters: f64,
    amount: f64,
}

/// Purchased liters and cost over the range.
pub async fn totals(conn: &mut PgConnection, user_id: i64, range: DateRange) -> Result<MilkFigures, sqlx::Error> {
    let rows = sqlx::query_as::<_, PurchaseTotalRow>(
        r#"SELECT milk_type,
                  (SUM(purchase_qty_liters))::FLOAT8 AS liters,
                  (SUM(purchase_qty_liters * purchase_rate))::FLOAT8 AS amount
           FROM purchase_entries
           WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
           GROUP BY milk_type"#,
    )
    .bind(user_id)
    .bind(range.start_date)
    .bind(range.end_date)
    .fetch_all(conn)
    .await?;

    let mut figures = MilkFigures::default();
    for row in rows {
        figures.add(row.milk_type, row.liters, row.amount);
    }
    Ok(figures)
}
