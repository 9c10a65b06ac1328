use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::billing::daily::RosterCustomer;
use crate::billing::rate::CustomerRates;
use crate::billing::MilkType;

/// Money and volume columns are NUMERIC; they are read as FLOAT8.
pub const CUSTOMER_COLUMNS: &str = r#"
    id, user_id, customer_name, whatsapp_no, milk_type, use_master_rate,
    (cow_rate)::FLOAT8 AS cow_rate,
    (buffalo_rate)::FLOAT8 AS buffalo_rate,
    (cow_default_liters)::FLOAT8 AS cow_default_liters,
    (buffalo_default_liters)::FLOAT8 AS buffalo_default_liters,
    (opening_balance)::FLOAT8 AS opening_balance,
    (pending_amount)::FLOAT8 AS pending_amount,
    archived_at, created_at
"#;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub customer_name: String,
    pub whatsapp_no: Option<String>,
    pub milk_type: MilkType,
    pub use_master_rate: bool,
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
    pub cow_default_liters: f64,
    pub buffalo_default_liters: f64,
    pub opening_balance: f64,
    pub pending_amount: f64,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn rates(&self) -> CustomerRates {
        CustomerRates {
            use_master_rate: self.use_master_rate,
            cow_rate: self.cow_rate,
            buffalo_rate: self.buffalo_rate,
        }
    }

    /// Quantity offered on a day that has not been recorded yet.
    pub fn default_liters(&self) -> f64 {
        match self.milk_type {
            MilkType::Cow => self.cow_default_liters,
            MilkType::Buffalo => self.buffalo_default_liters,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn roster_entry(&self) -> RosterCustomer {
        RosterCustomer {
            customer_id: self.id,
            customer_name: self.customer_name.clone(),
            milk_type: self.milk_type,
            default_liters: self.default_liters(),
        }
    }
}

pub async fn list_active(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Customer>, sqlx::Error> {
    let sql = format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers
         WHERE user_id = $1 AND archived_at IS NULL
         ORDER BY customer_name"
    );
    sqlx::query_as::<_, Customer>(&sql).bind(user_id).fetch_all(conn).await
}

/// Active and archived customers. Reports still show archived customers
/// that carry a bill or balance.
pub async fn list_all(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Customer>, sqlx::Error> {
    let sql = format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers
         WHERE user_id = $1
         ORDER BY archived_at IS NOT NULL, customer_name"
    );
    sqlx::query_as::<_, Customer>(&sql).bind(user_id).fetch_all(conn).await
}

pub async fn find_owned(
    conn: &mut PgConnection,
    user_id: i64,
    customer_id: i64,
) -> Result<Option<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(customer_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Same as [`find_owned`] but holds the row lock until the transaction ends.
pub async fn find_owned_for_update(
    conn: &mut PgConnection,
    user_id: i64,
    customer_id: i64,
) -> Result<Option<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND user_id = $2 FOR UPDATE");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(customer_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn has_history(conn: &mut PgConnection, customer_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (SELECT 1 FROM daily_milk_entries WHERE customer_id = $1 AND quantity > 0)
               OR EXISTS (SELECT 1 FROM bill_payments WHERE customer_id = $1)"#,
    )
    .bind(customer_id)
    .fetch_one(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(milk_type: MilkType) -> Customer {
        Customer {
            id: 3,
            user_id: 1,
            customer_name: "Meera".into(),
            whatsapp_no: None,
            milk_type,
            use_master_rate: false,
            cow_rate: Some(58.0),
            buffalo_rate: None,
            cow_default_liters: 1.0,
            buffalo_default_liters: 0.5,
            opening_balance: 0.0,
            pending_amount: 0.0,
            archived_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn default_quantity_follows_milk_type() {
        assert_eq!(customer(MilkType::Cow).default_liters(), 1.0);
        assert_eq!(customer(MilkType::Buffalo).default_liters(), 0.5);
    }

    #[test]
    fn roster_entry_carries_rate_free_fields() {
        let c = customer(MilkType::Buffalo);
        let entry = c.roster_entry();
        assert_eq!(entry.customer_id, 3);
        assert_eq!(entry.default_liters, 0.5);
        assert_eq!(c.rates().override_for(MilkType::Cow), Some(58.0));
    }
}
