use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

#[derive(Debug, FromRow)]
pub struct DairyInfo {
    pub dairy_name: String,
    pub updated_at: DateTime<Utc>,
}

pub async fn find(conn: &mut PgConnection, user_id: i64) -> Result<Option<DairyInfo>, sqlx::Error> {
    sqlx::query_as::<_, DairyInfo>("SELECT dairy_name, updated_at FROM dairy_info WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
