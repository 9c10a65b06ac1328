use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use crate::billing::rate::MasterRates;

#[derive(Debug, FromRow)]
pub struct MilkRateMaster {
    pub cow_rate: f64,
    pub buffalo_rate: f64,
    pub updated_at: DateTime<Utc>,
}

impl MilkRateMaster {
    pub fn rates(&self) -> MasterRates {
        MasterRates::new(self.cow_rate, self.buffalo_rate)
    }
}

pub async fn find(conn: &mut PgConnection, user_id: i64) -> Result<Option<MilkRateMaster>, sqlx::Error> {
    sqlx::query_as::<_, MilkRateMaster>(
        r#"SELECT (cow_rate)::FLOAT8 AS cow_rate, (buffalo_rate)::FLOAT8 AS buffalo_rate, updated_at
           FROM milk_rate_master WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Rates in force for the user; unset when the master row is missing.
pub async fn master_rates(conn: &mut PgConnection, user_id: i64) -> Result<MasterRates, sqlx::Error> {
    Ok(find(conn, user_id).await?.map(|m| m.rates()).unwrap_or_default())
}

pub async fn upsert(
    conn: &mut PgConnection,
    user_id: i64,
    rates: &MasterRates,
) -> Result<MilkRateMaster, sqlx::Error> {
    sqlx::query_as::<_, MilkRateMaster>(
        r#"INSERT INTO milk_rate_master (user_id, cow_rate, buffalo_rate)
           VALUES ($1, $2::FLOAT8, $3::FLOAT8)
           ON CONFLICT (user_id) DO UPDATE
               SET cow_rate = EXCLUDED.cow_rate,
                   buffalo_rate = EXCLUDED.buffalo_rate,
                   updated_at = NOW()
           RETURNING (cow_rate)::FLOAT8 AS cow_rate, (buffalo_rate)::FLOAT8 AS buffalo_rate, updated_at"#,
    )
    .bind(user_id)
    .bind(rates.cow_rate)
    .bind(rates.buffalo_rate)
    .fetch_one(conn)
    .await
}
