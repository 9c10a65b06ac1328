use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::rate::MasterRates;
use crate::billing::{fits_column, MAX_RATE};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct MilkRatesRequest {
    pub cow_rate: f64,
    pub buffalo_rate: f64,
}

impl MilkRatesRequest {
    pub fn validate(&self) -> Result<MasterRates, AppError> {
        for (name, rate) in [("cow_rate", self.cow_rate), ("buffalo_rate", self.buffalo_rate)] {
            if rate.is_nan() || rate <= 0.0 {
                return Err(AppError::validation(format!("{name} must be greater than 0")));
            }
            if !fits_column(rate, MAX_RATE) {
                return Err(AppError::validation(format!("{name} must be at most {MAX_RATE} with two decimals")));
            }
        }
        Ok(MasterRates::new(self.cow_rate, self.buffalo_rate))
    }
}

#[derive(Debug, Serialize)]
pub struct MilkRatesResponse {
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}
