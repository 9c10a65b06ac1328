use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::period::{BillingPeriod, DateRange, PeriodSelection};
use crate::billing::BillingError;

/// The period picker shared by the bill, report and dashboard screens.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodRequest {
    pub period: BillingPeriod,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub quarter: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PeriodRequest {
    pub fn selection(&self) -> Result<PeriodSelection, BillingError> {
        PeriodSelection::from_parts(
            self.period,
            self.year,
            self.month,
            self.quarter,
            self.start_date,
            self.end_date,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    pub period: BillingPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
}

impl PeriodResponse {
    pub fn new(period: BillingPeriod, range: DateRange) -> Self {
        Self { period, start_date: range.start_date, end_date: range.end_date, days: range.days() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_request_from_month_picker() {
        let req: PeriodRequest =
            serde_json::from_str(r#"{"period":"quarter","year":2025,"month":7}"#).unwrap();
        let range = req.selection().unwrap().resolve().unwrap();
        assert_eq!(range.start_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(range.end_date, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
    }

    #[test]
    fn custom_request_without_end_is_invalid() {
        let req: PeriodRequest =
            serde_json::from_str(r#"{"period":"custom","start_date":"2025-03-01"}"#).unwrap();
        assert!(matches!(req.selection(), Err(BillingError::InvalidPeriod(_))));
    }
}
