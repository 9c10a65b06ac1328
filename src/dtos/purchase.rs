use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::{fits_column, round_currency, MilkType, MAX_RATE};
use crate::error::AppError;
use crate::models::purchase::PurchaseEntry;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub milk_type: MilkType,
    pub purchase_qty_liters: f64,
    pub purchase_rate: f64,
    pub entry_date: NaiveDate,
}

impl PurchaseRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), AppError> {
        if self.purchase_qty_liters.is_nan() || self.purchase_qty_liters <= 0.0 {
            return Err(AppError::validation("Purchase quantity must be greater than 0"));
        }
        if self.purchase_rate.is_nan() || self.purchase_rate < 0.0 {
            return Err(AppError::validation("Purchase rate cannot be negative"));
        }
        if !fits_column(self.purchase_qty_liters, MAX_RATE) || !fits_column(self.purchase_rate, MAX_RATE) {
            return Err(AppError::validation(format!(
                "Purchase quantity and rate must be at most {MAX_RATE} with two decimals"
            )));
        }
        if self.entry_date > today {
            return Err(AppError::validation("Purchase date cannot be in the future"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub milk_type: MilkType,
    pub purchase_qty_liters: f64,
    pub purchase_rate: f64,
    pub amount: f64,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<PurchaseEntry> for PurchaseResponse {
    fn from(p: PurchaseEntry) -> Self {
        Self {
            amount: round_currency(p.amount()),
            id: p.id,
            milk_type: p.milk_type,
            purchase_qty_liters: p.purchase_qty_liters,
            purchase_rate: p.purchase_rate,
            entry_date: p.entry_date,
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(qty: f64, rate: f64, day: u32) -> PurchaseRequest {
        PurchaseRequest {
            milk_type: MilkType::Cow,
            purchase_qty_liters: qty,
            purchase_rate: rate,
            entry_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
        }
    }

    #[test]
    fn purchase_rules() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(request(40.0, 42.5, 10).validate(today).is_ok());
        assert!(request(40.0, 0.0, 1).validate(today).is_ok());
        assert!(request(0.0, 42.5, 1).validate(today).is_err());
        assert!(request(40.0, -1.0, 1).validate(today).is_err());
        assert!(request(40.0, 42.5, 11).validate(today).is_err());
        assert!(request(40.125, 42.5, 1).validate(today).is_err());
        assert!(request(1e9, 42.5, 1).validate(today).is_err());
    }
}
