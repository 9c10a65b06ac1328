use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::reconcile::{BalanceAudit, Standing};
use crate::billing::{fits_column, MilkType, MAX_AMOUNT, MAX_QUANTITY, MAX_RATE};
use crate::error::AppError;
use crate::models::customer::Customer;

const DEFAULT_COW_LITERS: f64 = 1.0;
const DEFAULT_BUFFALO_LITERS: f64 = 0.5;

fn default_true() -> bool {
    true
}

/// Fields shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerFields {
    pub customer_name: String,
    pub whatsapp_no: Option<String>,
    pub milk_type: MilkType,
    #[serde(default = "default_true")]
    pub use_master_rate: bool,
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
    pub cow_default_liters: Option<f64>,
    pub buffalo_default_liters: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    #[serde(flatten)]
    pub fields: CustomerFields,
    #[serde(default)]
    pub opening_balance: f64,
}

impl CreateCustomerRequest {
    /// The opening balance may be negative (credit) but must be a stored amount.
    pub fn opening_balance(&self) -> Result<f64, AppError> {
        if !fits_column(self.opening_balance, MAX_AMOUNT) {
            return Err(AppError::validation("Opening balance must be an amount with at most two decimals"));
        }
        Ok(self.opening_balance)
    }
}

/// What gets written after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCustomer {
    pub customer_name: String,
    pub whatsapp_no: Option<String>,
    pub milk_type: MilkType,
    pub use_master_rate: bool,
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
    pub cow_default_liters: f64,
    pub buffalo_default_liters: f64,
}

impl CustomerFields {
    pub fn validate(&self) -> Result<ValidCustomer, AppError> {
        let customer_name = self.customer_name.trim().to_string();
        if customer_name.chars().count() < 2 {
            return Err(AppError::validation("Customer name must be at least 2 characters"));
        }

        let whatsapp_no = match self.whatsapp_no.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(normalize_whatsapp(raw)?),
        };

        Ok(ValidCustomer {
            customer_name,
            whatsapp_no,
            milk_type: self.milk_type,
            use_master_rate: self.use_master_rate,
            cow_rate: rate_override("cow_rate", self.cow_rate)?,
            buffalo_rate: rate_override("buffalo_rate", self.buffalo_rate)?,
            cow_default_liters: default_liters("cow_default_liters", self.cow_default_liters, DEFAULT_COW_LITERS)?,
            buffalo_default_liters: default_liters(
                "buffalo_default_liters",
                self.buffalo_default_liters,
                DEFAULT_BUFFALO_LITERS,
            )?,
        })
    }
}

/// Ten digits starting with 6-9 once spaces, dashes and the like are gone.
pub fn normalize_whatsapp(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let valid = digits.len() == 10 && matches!(digits.as_bytes().first().copied(), Some(b'6'..=b'9'));
    if !valid {
        return Err(AppError::validation("WhatsApp number must be 10 digits starting with 6-9"));
    }
    Ok(digits)
}

// Zero means "no override".
fn rate_override(field: &str, rate: Option<f64>) -> Result<Option<f64>, AppError> {
    match rate {
        None => Ok(None),
        Some(r) if r < 0.0 => Err(AppError::validation(format!("{field} cannot be negative"))),
        Some(r) if !fits_column(r, MAX_RATE) => Err(AppError::validation(format!(
            "{field} must be at most {MAX_RATE} with two decimals"
        ))),
        Some(r) if r == 0.0 => Ok(None),
        Some(r) => Ok(Some(r)),
    }
}

fn default_liters(field: &str, liters: Option<f64>, fallback: f64) -> Result<f64, AppError> {
    match liters {
        None => Ok(fallback),
        Some(l) if l < 0.0 => Err(AppError::validation(format!("{field} cannot be negative"))),
        Some(l) if !fits_column(l, MAX_QUANTITY) => Err(AppError::validation(format!(
            "{field} must be at most {MAX_QUANTITY} liters with two decimals"
        ))),
        Some(l) => Ok(l),
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i64,
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
    pub standing: Standing,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            standing: Standing::of(c.pending_amount),
            customer_name: c.customer_name,
            whatsapp_no: c.whatsapp_no,
            milk_type: c.milk_type,
            use_master_rate: c.use_master_rate,
            cow_rate: c.cow_rate,
            buffalo_rate: c.buffalo_rate,
            cow_default_liters: c.cow_default_liters,
            buffalo_default_liters: c.buffalo_default_liters,
            opening_balance: c.opening_balance,
            pending_amount: c.pending_amount,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Archived,
}

#[derive(Debug, Serialize)]
pub struct DeleteCustomerResponse {
    pub id: i64,
    pub outcome: DeleteOutcome,
}

#[derive(Debug, Serialize)]
pub struct BalanceAuditResponse {
    pub customer_id: i64,
    #[serde(flatten)]
    pub audit: BalanceAudit,
    pub repaired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, whatsapp: Option<&str>) -> CustomerFields {
        CustomerFields {
            customer_name: name.into(),
            whatsapp_no: whatsapp.map(Into::into),
            milk_type: MilkType::Cow,
            use_master_rate: true,
            cow_rate: None,
            buffalo_rate: None,
            cow_default_liters: None,
            buffalo_default_liters: None,
        }
    }

    #[test]
    fn whatsapp_is_stripped_to_digits() {
        assert_eq!(normalize_whatsapp("98765 43210").unwrap(), "9876543210");
        assert_eq!(normalize_whatsapp("(712) 345-6789").unwrap(), "7123456789");
    }

    #[test]
    fn whatsapp_must_start_with_six_to_nine() {
        assert!(normalize_whatsapp("5876543210").is_err());
        assert!(normalize_whatsapp("987654321").is_err());
        assert!(normalize_whatsapp("+91 9876543210").is_err());
    }

    #[test]
    fn blank_whatsapp_is_treated_as_absent() {
        let valid = fields("Asha", Some("  ")).validate().unwrap();
        assert_eq!(valid.whatsapp_no, None);
    }

    #[test]
    fn short_names_are_rejected() {
        assert!(fields(" A ", None).validate().is_err());
        assert_eq!(fields("  Ravi ", None).validate().unwrap().customer_name, "Ravi");
    }

    #[test]
    fn defaults_and_zero_override_are_filled_in() {
        let mut f = fields("Asha", None);
        f.cow_rate = Some(0.0);
        let valid = f.validate().unwrap();
        assert_eq!(valid.cow_rate, None);
        assert_eq!(valid.cow_default_liters, 1.0);
        assert_eq!(valid.buffalo_default_liters, 0.5);
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let mut f = fields("Asha", None);
        f.buffalo_rate = Some(-1.0);
        assert!(f.validate().is_err());

        let mut f = fields("Asha", None);
        f.cow_default_liters = Some(-0.5);
        assert!(f.validate().is_err());
    }

    #[test]
    fn numbers_the_columns_cannot_hold_are_rejected() {
        let mut f = fields("Asha", None);
        f.cow_default_liters = Some(0.125);
        assert!(f.validate().is_err());

        let mut f = fields("Asha", None);
        f.buffalo_rate = Some(62.555);
        assert!(f.validate().is_err());

        let mut f = fields("Asha", None);
        f.cow_default_liters = Some(1.25);
        assert_eq!(f.validate().unwrap().cow_default_liters, 1.25);

        let req = CreateCustomerRequest { fields: fields("Asha", None), opening_balance: 100.005 };
        assert!(req.opening_balance().is_err());
        let req = CreateCustomerRequest { fields: fields("Asha", None), opening_balance: -40.5 };
        assert_eq!(req.opening_balance().unwrap(), -40.5);
    }

    #[test]
    fn create_request_accepts_flat_json() {
        let req: CreateCustomerRequest = serde_json::from_str(
            r#"{"customer_name":"Asha","milk_type":"buffalo","opening_balance":250}"#,
        )
        .unwrap();
        assert_eq!(req.fields.milk_type, MilkType::Buffalo);
        assert!(req.fields.use_master_rate);
        assert_eq!(req.opening_balance, 250.0);
    }
}
