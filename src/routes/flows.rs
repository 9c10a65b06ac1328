//! End-to-end flows against a real database. Each test gets a fresh,
//! migrated database from `#[sqlx::test]`; run them with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use super::app;
use crate::auth::jwt::sign_token;
use crate::billing::rate::MasterRates;
use crate::config::AppConfig;
use crate::notify::LogNotifier;
use crate::state::AppState;

const SECRET: &str = "flow-test-secret";

struct Tenant {
    app: Router,
    token: String,
}

impl Tenant {
    /// A registered user with master rates of 55 (cow) and 65 (buffalo).
    async fn seed(pool: PgPool) -> Self {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash) VALUES ('gokul', 'not-a-hash') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO milk_rate_master (user_id, cow_rate, buffalo_rate) VALUES ($1, 55, 65)")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let config = AppConfig {
            database_url: String::new(),
            host: [127, 0, 0, 1].into(),
            port: 3000,
            jwt_secret: SECRET.into(),
            token_ttl_hours: 1,
            db_max_connections: 5,
            default_rates: MasterRates::new(55.0, 65.0),
        };
        let token = sign_token(user_id, "gokul", SECRET, 1).unwrap();
        Tenant { app: app(AppState::new(pool, config, Arc::new(LogNotifier))), token }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(format!("/milk-billing{uri}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    async fn add_customer(&self, name: &str, opening_balance: f64) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/customers",
                Some(json!({
                    "customer_name": name,
                    "whatsapp_no": "98765 43210",
                    "milk_type": "cow",
                    "opening_balance": opening_balance
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn deliver(&self, customer_id: i64, entry_date: &str, quantity: f64) {
        let (status, body) = self
            .call(
                Method::PUT,
                "/daily-entries",
                Some(json!({
                    "entry_date": entry_date,
                    "entries": [{"customer_id": customer_id, "milk_type": "cow", "quantity": quantity}]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn march_bill(&self, customer_id: i64) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/reports/customer-bills",
                Some(json!({"period": "month", "year": 2025, "month": 3})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["customers"]
            .as_array()
            .unwrap()
            .iter()
            .find(|line| line["customer_id"].as_i64() == Some(customer_id))
            .cloned()
            .unwrap()
    }

    async fn pay_march(&self, customer_id: i64, current_bill: f64, previous_pending: f64, amount_paid: f64) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/billing/payments",
            Some(json!({
                "customer_id": customer_id,
                "current_bill": current_bill,
                "previous_pending": previous_pending,
                "amount_paid": amount_paid,
                "billing_period": "month",
                "period_start_date": "2025-03-01",
                "period_end_date": "2025-03-31"
            })),
        )
        .await
    }

    async fn pending_of(&self, customer_id: i64) -> f64 {
        let (_, body) = self.call(Method::GET, "/customers", None).await;
        body.as_array()
            .unwrap()
            .iter()
            .find(|c| c["id"].as_i64() == Some(customer_id))
            .and_then(|c| c["pending_amount"].as_f64())
            .unwrap()
    }
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn paid_period_has_nothing_left_to_bill(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 100.0).await;
    tenant.deliver(asha, "2025-03-01", 1.0).await;
    tenant.deliver(asha, "2025-03-02", 1.0).await;

    let bill = tenant.march_bill(asha).await;
    assert_eq!(bill["current_bill"].as_f64(), Some(110.0));
    assert_eq!(bill["pending_amount"].as_f64(), Some(100.0));
    assert_eq!(bill["total_due"].as_f64(), Some(210.0));

    let (status, payment) = tenant.pay_march(asha, 110.0, 100.0, 150.0).await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["pending_after"].as_f64(), Some(60.0));

    let reread = tenant.march_bill(asha).await;
    assert_eq!(reread["current_bill"].as_f64(), Some(0.0));
    assert_eq!(reread["already_billed"].as_f64(), Some(110.0));
    assert_eq!(reread["pending_amount"].as_f64(), Some(60.0));
    assert_eq!(reread["overlapping_payments"].as_i64(), Some(0));

    let (_, audit) = tenant.call(Method::GET, &format!("/customers/{asha}/balance-audit"), None).await;
    assert_eq!(audit["in_balance"], true);
    assert_eq!(audit["recomputed_pending"].as_f64(), Some(60.0));
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn stale_figures_conflict_and_leave_pending_alone(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 100.0).await;
    tenant.deliver(asha, "2025-03-01", 1.0).await;

    let (status, _) = tenant.pay_march(asha, 55.0, 100.0, 55.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tenant.pending_of(asha).await, 100.0);

    // same screen submitted again: the bill is already folded into pending
    let (status, body) = tenant.pay_march(asha, 55.0, 100.0, 55.0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(tenant.pending_of(asha).await, 100.0);

    let (_, payments) = tenant.call(Method::GET, &format!("/billing/payments?customer_id={asha}"), None).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn holiday_reads_back_as_zero_for_everyone(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 0.0).await;
    let ravi = tenant.add_customer("Ravi", 0.0).await;

    let (status, _) = tenant
        .call(
            Method::PUT,
            "/daily-entries",
            Some(json!({
                "entry_date": "2025-03-05",
                "is_holiday": true,
                "entries": [{"customer_id": asha, "milk_type": "cow", "quantity": 2.0}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, day) = tenant.call(Method::GET, "/daily-entries?entry_date=2025-03-05", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["is_holiday"], true);
    assert_eq!(day["recorded"], true);
    let entries = day["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|line| line["quantity"].as_f64() == Some(0.0)));

    assert_eq!(tenant.march_bill(ravi).await["current_bill"].as_f64(), Some(0.0));
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn concurrent_saves_of_one_day_both_succeed(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 0.0).await;

    tokio::join!(
        tenant.deliver(asha, "2025-03-07", 1.5),
        tenant.deliver(asha, "2025-03-07", 2.5),
    );

    let (_, day) = tenant.call(Method::GET, "/daily-entries?entry_date=2025-03-07", None).await;
    let entries = day["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    let quantity = entries[0]["quantity"].as_f64().unwrap();
    assert!(quantity == 1.5 || quantity == 2.5);
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn payment_straddling_the_report_is_flagged(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 0.0).await;
    tenant.deliver(asha, "2025-03-01", 1.0).await;
    tenant.deliver(asha, "2025-04-01", 1.0).await;

    let (status, body) = tenant
        .call(
            Method::POST,
            "/billing/payments",
            Some(json!({
                "customer_id": asha,
                "current_bill": 55.0,
                "previous_pending": 0.0,
                "amount_paid": 55.0,
                "billing_period": "custom",
                "period_start_date": "2025-03-15",
                "period_end_date": "2025-04-15"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let march = tenant.march_bill(asha).await;
    assert_eq!(march["current_bill"].as_f64(), Some(55.0));
    assert_eq!(march["overlapping_payments"].as_i64(), Some(1));
}

#[sqlx::test]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn bill_notice_needs_no_body(pool: PgPool) {
    let tenant = Tenant::seed(pool).await;
    let asha = tenant.add_customer("Asha", 250.0).await;

    let (status, body) = tenant.call(Method::POST, &format!("/reports/customer-bills/{asha}/send"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["delivered"], true);
    assert_eq!(body["figures"]["pending_amount"].as_f64(), Some(250.0));
}
