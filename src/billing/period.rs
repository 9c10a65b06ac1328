use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Month,
    Quarter,
    Custom,
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, BillingError> {
        if end_date < start_date {
            return Err(BillingError::InvalidRange { start: start_date, end: end_date });
        }
        Ok(Self { start_date, end_date })
    }

    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSelection {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Custom { start_date: NaiveDate, end_date: NaiveDate },
}

impl PeriodSelection {
    /// Builds a selection from the loose shape the bill, report and dashboard
    /// screens send. A quarter may be given directly or derived from a month.
    pub fn from_parts(
        period: BillingPeriod,
        year: Option<i32>,
        month: Option<u32>,
        quarter: Option<u32>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, BillingError> {
        let missing = |field: &str| BillingError::InvalidPeriod(format!("{field} is required"));

        let selection = match period {
            BillingPeriod::Month => PeriodSelection::Month {
                year: year.ok_or_else(|| missing("year"))?,
                month: month.ok_or_else(|| missing("month"))?,
            },
            BillingPeriod::Quarter => {
                let quarter = match (quarter, month) {
                    (Some(q), _) => q,
                    (None, Some(m)) => quarter_of_month(m)?,
                    (None, None) => return Err(missing("quarter or month")),
                };
                PeriodSelection::Quarter { year: year.ok_or_else(|| missing("year"))?, quarter }
            }
            BillingPeriod::Custom => PeriodSelection::Custom {
                start_date: start_date.ok_or_else(|| missing("start_date"))?,
                end_date: end_date.ok_or_else(|| missing("end_date"))?,
            },
        };
        Ok(selection)
    }

    /// The calendar month before `today`; bill notices default to it.
    pub fn previous_month(today: NaiveDate) -> Self {
        if today.month() == 1 {
            PeriodSelection::Month { year: today.year() - 1, month: 12 }
        } else {
            PeriodSelection::Month { year: today.year(), month: today.month() - 1 }
        }
    }

    pub fn kind(&self) -> BillingPeriod {
        match self {
            PeriodSelection::Month { .. } => BillingPeriod::Month,
            PeriodSelection::Quarter { .. } => BillingPeriod::Quarter,
            PeriodSelection::Custom { .. } => BillingPeriod::Custom,
        }
    }

    pub fn resolve(&self) -> Result<DateRange, BillingError> {
        match *self {
            PeriodSelection::Month { year, month } => month_range(year, month)
                .ok_or_else(|| BillingError::InvalidPeriod(format!("month {month} of {year} does not exist"))),
            PeriodSelection::Quarter { year, quarter } => {
                if !(1..=4).contains(&quarter) {
                    return Err(BillingError::InvalidPeriod(format!("quarter must be 1-4, got {quarter}")));
                }
                let first_month = (quarter - 1) * 3 + 1;
                let first = month_range(year, first_month);
                let last = month_range(year, first_month + 2);
                match (first, last) {
                    (Some(first), Some(last)) => DateRange::new(first.start_date, last.end_date),
                    _ => Err(BillingError::InvalidPeriod(format!("year {year} is out of range"))),
                }
            }
            PeriodSelection::Custom { start_date, end_date } => DateRange::new(start_date, end_date),
        }
    }
}

pub fn quarter_of_month(month: u32) -> Result<u32, BillingError> {
    if !(1..=12).contains(&month) {
        return Err(BillingError::InvalidPeriod(format!("month must be 1-12, got {month}")));
    }
    Ok(month.div_ceil(3))
}

fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start_date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end_date = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some(DateRange { start_date, end_date })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn leap_february_ends_on_the_29th() {
        let range = PeriodSelection::Month { year: 2024, month: 2 }.resolve().unwrap();
        assert_eq!(range.start_date, date(2024, 2, 1));
        assert_eq!(range.end_date, date(2024, 2, 29));
        assert_eq!(range.days(), 29);
    }

    #[test]
    fn december_rolls_into_next_year_boundary() {
        let range = PeriodSelection::Month { year: 2023, month: 12 }.resolve().unwrap();
        assert_eq!(range.end_date, date(2023, 12, 31));
    }

    #[test]
    fn july_falls_in_the_third_quarter() {
        let selection = PeriodSelection::from_parts(
            BillingPeriod::Quarter, Some(2025), Some(7), None, None, None,
        )
        .unwrap();
        assert_eq!(selection, PeriodSelection::Quarter { year: 2025, quarter: 3 });

        let range = selection.resolve().unwrap();
        assert_eq!(range.start_date, date(2025, 7, 1));
        assert_eq!(range.end_date, date(2025, 9, 30));
    }

    #[test]
    fn explicit_quarter_wins_over_month() {
        let selection = PeriodSelection::from_parts(
            BillingPeriod::Quarter, Some(2025), Some(7), Some(1), None, None,
        )
        .unwrap();
        let range = selection.resolve().unwrap();
        assert_eq!(range.start_date, date(2025, 1, 1));
        assert_eq!(range.end_date, date(2025, 3, 31));
    }

    #[test]
    fn custom_range_is_passed_through() {
        let selection = PeriodSelection::from_parts(
            BillingPeriod::Custom, None, None, None, Some(date(2025, 3, 5)), Some(date(2025, 3, 5)),
        )
        .unwrap();
        let range = selection.resolve().unwrap();
        assert_eq!(range.days(), 1);
        assert_eq!(range.start_date, range.end_date);
    }

    #[test]
    fn reversed_custom_range_is_rejected() {
        let err = PeriodSelection::Custom { start_date: date(2025, 3, 10), end_date: date(2025, 3, 1) }
            .resolve()
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidRange { .. }));
    }

    #[test]
    fn missing_fields_and_bad_numbers_are_invalid_periods() {
        let err = PeriodSelection::from_parts(BillingPeriod::Month, Some(2025), None, None, None, None).unwrap_err();
        assert!(matches!(err, BillingError::InvalidPeriod(_)));

        let err = PeriodSelection::Month { year: 2025, month: 13 }.resolve().unwrap_err();
        assert!(matches!(err, BillingError::InvalidPeriod(_)));

        let err = PeriodSelection::Quarter { year: 2025, quarter: 5 }.resolve().unwrap_err();
        assert!(matches!(err, BillingError::InvalidPeriod(_)));
    }

    #[test]
    fn previous_month_wraps_january() {
        assert_eq!(
            PeriodSelection::previous_month(date(2026, 1, 15)),
            PeriodSelection::Month { year: 2025, month: 12 }
        );
        assert_eq!(
            PeriodSelection::previous_month(date(2026, 10, 18)),
            PeriodSelection::Month { year: 2026, month: 9 }
        );
    }

    #[test]
    fn days_count_both_ends() {
        let range = PeriodSelection::Month { year: 2025, month: 3 }.resolve().unwrap();
        assert_eq!(range.days(), 31);
        assert_eq!(DateRange::new(date(2025, 3, 31), date(2025, 4, 1)).unwrap().days(), 2);
    }
}
