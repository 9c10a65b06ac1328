use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection};

use crate::billing::bill::VolumeTally;
use crate::billing::daily::EntryLine;
use crate::billing::period::DateRange;
use crate::billing::MilkType;

#[derive(Debug, FromRow)]
struct EntryRow {
    customer_id: i64,
    milk_type: MilkType,
    quantity: f64,
}

impl From<EntryRow> for EntryLine {
    fn from(row: EntryRow) -> Self {
        EntryLine { customer_id: row.customer_id, milk_type: row.milk_type, quantity: row.quantity }
    }
}

#[derive(Debug, FromRow)]
struct VolumeRow {
    customer_id: i64,
    milk_type: MilkType,
    liters: f64,
}

#[derive(Debug, FromRow)]
struct MonthRow {
    month: i32,
    milk_type: MilkType,
    liters: f64,
}

/// The stored holiday flag, or `None` when the day was never saved.
pub async fn day_flag(conn: &mut PgConnection, user_id: i64, entry_date: NaiveDate) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT is_holiday FROM daily_entry_days WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(user_id)
    .bind(entry_date)
    .fetch_optional(conn)
    .await
}

pub async fn entries_on(conn: &mut PgConnection, user_id: i64, entry_date: NaiveDate) -> Result<Vec<EntryLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EntryRow>(
        r#"SELECT e.customer_id, e.milk_type, (e.quantity)::FLOAT8 AS quantity
           FROM daily_milk_entries e
           JOIN customers c ON c.id = e.customer_id
           WHERE c.user_id = $1 AND e.entry_date = $2
           ORDER BY e.customer_id, e.milk_type"#,
    )
    .bind(user_id)
    .bind(entry_date)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(EntryLine::from).collect())
}

/// Replaces the active customers' snapshot for one date. Run inside a
/// transaction; archived customers keep whatever they had.
///
/// The day row is written first so it stays locked until commit and a
/// concurrent save of the same date waits instead of racing the delete.
pub async fn replace_day(
    conn: &mut PgConnection,
    user_id: i64,
    entry_date: NaiveDate,
    is_holiday: bool,
    rows: &[EntryLine],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO daily_entry_days (user_id, entry_date, is_holiday)
           VALUES ($1, $2, $3)
           ON CONFLICT (user_id, entry_date) DO UPDATE
               SET is_holiday = EXCLUDED.is_holiday, saved_at = NOW()"#,
    )
    .bind(user_id)
    .bind(entry_date)
    .bind(is_holiday)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"DELETE FROM daily_milk_entries e
           USING customers c
           WHERE e.customer_id = c.id
             AND c.user_id = $1
             AND c.archived_at IS NULL
             AND e.entry_date = $2"#,
    )
    .bind(user_id)
    .bind(entry_date)
    .execute(&mut *conn)
    .await?;

    for row in rows {
        sqlx::query(
            r#"INSERT INTO daily_milk_entries (customer_id, entry_date, milk_type, quantity)
               VALUES ($1, $2, $3, $4::FLOAT8)"#,
        )
        .bind(row.customer_id)
        .bind(entry_date)
        .bind(row.milk_type)
        .bind(row.quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Liters per customer over the range. `only` narrows to one customer.
pub async fn volumes(
    conn: &mut PgConnection,
    user_id: i64,
    range: DateRange,
    only: Option<i64>,
) -> Result<HashMap<i64, VolumeTally>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VolumeRow>(
        r#"SELECT e.customer_id, e.milk_type, (SUM(e.quantity))::FLOAT8 AS liters
           FROM daily_milk_entries e
           JOIN customers c ON c.id = e.customer_id
           WHERE c.user_id = $1
             AND e.entry_date BETWEEN $2 AND $3
             AND ($4::BIGINT IS NULL OR e.customer_id = $4)
           GROUP BY e.customer_id, e.milk_type"#,
    )
    .bind(user_id)
    .bind(range.start_date)
    .bind(range.end_date)
    .bind(only)
    .fetch_all(conn)
    .await?;

    let mut by_customer: HashMap<i64, VolumeTally> = HashMap::new();
    for row in rows {
        by_customer.entry(row.customer_id).or_default().add(row.milk_type, row.liters);
    }
    Ok(by_customer)
}

/// `(month, milk type, liters)` delivered in `year`.
pub async fn sold_by_month(conn: &mut PgConnection, user_id: i64, year: i32) -> Result<Vec<(u32, MilkType, f64)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MonthRow>(
        r#"SELECT (EXTRACT(MONTH FROM e.entry_date))::INT4 AS month,
                  e.milk_type,
                  (SUM(e.quantity))::FLOAT8 AS liters
           FROM daily_milk_entries e
           JOIN customers c ON c.id = e.customer_id
           WHERE c.user_id = $1 AND EXTRACT(YEAR FROM e.entry_date) = $2
           GROUP BY 1, 2"#,
    )
    .bind(user_id)
    .bind(year)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| u32::try_from(r.month).ok().map(|m| (m, r.milk_type, r.liters)))
        .collect())
}
