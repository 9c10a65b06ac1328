use axum::extract::State;
use axum::{Extension, Json};
use tracing::instrument;

use crate::dtos::dairy_info::{DairyInfoRequest, DairyInfoResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::dairy_info::{self, DairyInfo};
use crate::state::AppState;

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn get_dairy_info(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<DairyInfoResponse>, AppError> {
    let mut conn = db_pool.acquire().await?;
    let info = dairy_info::find(&mut conn, auth.user_id).await?;

    Ok(Json(DairyInfoResponse {
        dairy_name: info.as_ref().map(|i| i.dairy_name.clone()),
        updated_at: info.map(|i| i.updated_at),
    }))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn update_dairy_info(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<DairyInfoRequest>,
) -> Result<Json<DairyInfoResponse>, AppError> {
    let dairy_name = req.dairy_name.trim();
    if dairy_name.is_empty() {
        return Err(AppError::validation("Dairy name required"));
    }

    let saved = sqlx::query_as::<_, DairyInfo>(
        r#"INSERT INTO dairy_info (user_id, dairy_name) VALUES ($1, $2)
           ON CONFLICT (user_id) DO UPDATE SET dairy_name = EXCLUDED.dairy_name, updated_at = NOW()
           RETURNING dairy_name, updated_at"#,
    )
    .bind(auth.user_id)
    .bind(dairy_name)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(DairyInfoResponse { dairy_name: Some(saved.dairy_name), updated_at: Some(saved.updated_at) }))
}
