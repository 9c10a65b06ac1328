use axum::extract::{Path, State};
use axum::{Extension, Json};
use http::StatusCode;
use tracing::instrument;

use crate::billing::reconcile;
use crate::billing::same_amount;
use crate::dtos::customer::{
    BalanceAuditResponse, CreateCustomerRequest, CustomerFields, CustomerResponse, DeleteCustomerResponse,
    DeleteOutcome, ValidCustomer,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::customer::{self, Customer, CUSTOMER_COLUMNS};
use crate::models::bill_payment;
use crate::state::AppState;

fn map_unique_name(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return AppError::validation("A customer with this name already exists");
        }
    }
    AppError::db(e)
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn list_customers(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let mut conn = db_pool.acquire().await?;
    let customers = customer::list_active(&mut conn, auth.user_id).await?;
    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn create_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    let valid = req.fields.validate()?;
    let opening_balance = req.opening_balance()?;

    // A new customer starts with their opening balance pending.
    let sql = format!(
        "INSERT INTO customers
             (user_id, customer_name, whatsapp_no, milk_type, use_master_rate, cow_rate, buffalo_rate,
              cow_default_liters, buffalo_default_liters, opening_balance, pending_amount)
         VALUES ($1, $2, $3, $4, $5, $6::FLOAT8, $7::FLOAT8, $8::FLOAT8, $9::FLOAT8, $10::FLOAT8, $10::FLOAT8)
         RETURNING {CUSTOMER_COLUMNS}"
    );
    let created = sqlx::query_as::<_, Customer>(&sql)
        .bind(auth.user_id)
        .bind(&valid.customer_name)
        .bind(&valid.whatsapp_no)
        .bind(valid.milk_type)
        .bind(valid.use_master_rate)
        .bind(valid.cow_rate)
        .bind(valid.buffalo_rate)
        .bind(valid.cow_default_liters)
        .bind(valid.buffalo_default_liters)
        .bind(opening_balance)
        .fetch_one(&db_pool)
        .await
        .map_err(map_unique_name)?;

    tracing::info!(customer_id = created.id, "Customer created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = id))]
pub async fn update_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<CustomerFields>,
) -> Result<Json<CustomerResponse>, AppError> {
    let ValidCustomer {
        customer_name,
        whatsapp_no,
        milk_type,
        use_master_rate,
        cow_rate,
        buffalo_rate,
        cow_default_liters,
        buffalo_default_liters,
    } = req.validate()?;

    // Opening and pending balances only move through payments.
    let sql = format!(
        "UPDATE customers
         SET customer_name = $3, whatsapp_no = $4, milk_type = $5, use_master_rate = $6,
             cow_rate = $7::FLOAT8, buffalo_rate = $8::FLOAT8,
             cow_default_liters = $9::FLOAT8, buffalo_default_liters = $10::FLOAT8
         WHERE id = $1 AND user_id = $2 AND archived_at IS NULL
         RETURNING {CUSTOMER_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .bind(auth.user_id)
        .bind(customer_name)
        .bind(whatsapp_no)
        .bind(milk_type)
        .bind(use_master_rate)
        .bind(cow_rate)
        .bind(buffalo_rate)
        .bind(cow_default_liters)
        .bind(buffalo_default_liters)
        .fetch_optional(&db_pool)
        .await
        .map_err(map_unique_name)?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(updated.into()))
}

/// Customers with deliveries, payments or an open balance are archived so
/// their history stays billable; anyone else is removed outright.
#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = id))]
pub async fn delete_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteCustomerResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let existing = customer::find_owned_for_update(&mut *tx, auth.user_id, id)
        .await?
        .filter(|c| !c.is_archived())
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    let keep = !same_amount(existing.pending_amount, 0.0) || customer::has_history(&mut *tx, id).await?;

    let outcome = if keep {
        sqlx::query("UPDATE customers SET archived_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        DeleteOutcome::Archived
    } else {
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        DeleteOutcome::Deleted
    };

    tx.commit().await?;

    tracing::info!(?outcome, "Customer removed");
    Ok(Json(DeleteCustomerResponse { id, outcome }))
}

#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = id))]
pub async fn audit_balance(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<BalanceAuditResponse>, AppError> {
    let mut conn = db_pool.acquire().await?;

    let existing = customer::find_owned(&mut conn, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;
    let history = bill_payment::history(&mut conn, id).await?;

    let audit = reconcile::audit(existing.opening_balance, existing.pending_amount, &history);
    if !audit.in_balance {
        tracing::warn!(drift = audit.drift, "Pending balance drifted from payment history");
    }

    Ok(Json(BalanceAuditResponse { customer_id: id, audit, repaired: false }))
}

/// Rewrites the cached pending from the opening balance and payment history.
#[instrument(skip_all, fields(user_id = auth.user_id, customer_id = id))]
pub async fn repair_balance(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<BalanceAuditResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let existing = customer::find_owned_for_update(&mut *tx, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;
    let history = bill_payment::history(&mut *tx, id).await?;

    let audit = reconcile::audit(existing.opening_balance, existing.pending_amount, &history);
    let repaired = !audit.in_balance;
    if repaired {
        sqlx::query("UPDATE customers SET pending_amount = $2::FLOAT8 WHERE id = $1")
            .bind(id)
            .bind(audit.recomputed_pending)
            .execute(&mut *tx)
            .await?;
        tracing::info!(
            from = audit.cached_pending,
            to = audit.recomputed_pending,
            "Pending balance repaired"
        );
    }

    tx.commit().await?;

    Ok(Json(BalanceAuditResponse { customer_id: id, audit, repaired }))
}
