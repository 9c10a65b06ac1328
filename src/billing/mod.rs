//! Billing computation core.
//!
//! Everything in here is pure: no database, no clock. Handlers load rows,
//! hand them to these functions and persist what comes back.

pub mod bill;
pub mod daily;
pub mod dashboard;
pub mod period;
pub mod rate;
pub mod reconcile;

use chrono::NaiveDate;
use thiserror::Error;

pub use rate::MilkType;

/// Largest delivery or default quantity a `NUMERIC(8, 2)` column holds.
pub const MAX_QUANTITY: f64 = 999_999.99;
/// Largest rate or purchase quantity a `NUMERIC(10, 2)` column holds.
pub const MAX_RATE: f64 = 99_999_999.99;
/// Largest money amount a `NUMERIC(12, 2)` column holds.
pub const MAX_AMOUNT: f64 = 9_999_999_999.99;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillingError {
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid period selection: {0}")]
    InvalidPeriod(String),

    #[error("no {0} rate configured")]
    MissingRate(MilkType),

    #[error("quantity must be between 0 and 999999.99 with at most two decimals (customer {customer_id}, got {quantity})")]
    InvalidQuantity { customer_id: i64, quantity: f64 },

    #[error("customer {customer_id} has more than one {milk_type} entry for the day")]
    DuplicateEntry { customer_id: i64, milk_type: MilkType },

    #[error("amount paid must be between 0 and 9999999999.99 with at most two decimals, got {0}")]
    InvalidAmount(f64),
}

/// Rounds to paise.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Equal once rounded to paise.
pub fn same_amount(a: f64, b: f64) -> bool {
    round_currency(a - b) == 0.0
}

/// Whether `value` is stored as given by a two-decimal column capped at `max`.
pub fn fits_column(value: f64, max: f64) -> bool {
    let paise = value * 100.0;
    value.is_finite() && value.abs() <= max && (paise - paise.round()).abs() < 1e-3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_currency(10.006), 10.01);
        assert_eq!(round_currency(-3.333), -3.33);
        assert_eq!(round_currency(1650.0), 1650.0);
    }

    #[test]
    fn amounts_within_a_paisa_are_the_same() {
        assert!(same_amount(100.0, 100.004));
        assert!(!same_amount(100.0, 100.02));
        // a whole paisa apart is never the same, whatever the float error
        assert!(!same_amount(1650.0, 1649.99));
    }

    #[test]
    fn column_fit_rejects_a_third_decimal_and_overflow() {
        assert!(fits_column(100.01, MAX_AMOUNT));
        assert!(fits_column(0.1, MAX_QUANTITY));
        assert!(fits_column(MAX_QUANTITY, MAX_QUANTITY));
        assert!(!fits_column(100.005, MAX_AMOUNT));
        assert!(!fits_column(0.125, MAX_QUANTITY));
        assert!(!fits_column(1_000_000.0, MAX_QUANTITY));
        assert!(!fits_column(f64::NAN, MAX_AMOUNT));
    }
}
