//! Full-day delivery snapshots.
//!
//! A date is in exactly one of three states. `NotYetRecorded` is never
//! persisted; the other two are stored as a day row plus one entry row per
//! (customer, milk type).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{fits_column, BillingError, MilkType, MAX_QUANTITY};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryLine {
    pub customer_id: i64,
    pub milk_type: MilkType,
    pub quantity: f64,
}

/// One active customer as the daily sheet sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterCustomer {
    pub customer_id: i64,
    pub customer_name: String,
    pub milk_type: MilkType,
    pub default_liters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetLine {
    pub customer_id: i64,
    pub customer_name: String,
    pub milk_type: MilkType,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayRecord {
    Holiday,
    Entries(BTreeMap<(i64, MilkType), f64>),
    NotYetRecorded,
}

impl DayRecord {
    /// Validates a save request. Holiday submissions still have their lines
    /// checked, but the lines themselves are discarded.
    pub fn from_submission(is_holiday: bool, lines: &[EntryLine]) -> Result<Self, BillingError> {
        let mut entries = BTreeMap::new();
        for line in lines {
            if line.quantity < 0.0 || !fits_column(line.quantity, MAX_QUANTITY) {
                return Err(BillingError::InvalidQuantity {
                    customer_id: line.customer_id,
                    quantity: line.quantity,
                });
            }
            if entries.insert((line.customer_id, line.milk_type), line.quantity).is_some() {
                return Err(BillingError::DuplicateEntry {
                    customer_id: line.customer_id,
                    milk_type: line.milk_type,
                });
            }
        }
        if is_holiday {
            Ok(DayRecord::Holiday)
        } else {
            Ok(DayRecord::Entries(entries))
        }
    }

    /// `day` is the stored holiday flag, `None` when no snapshot exists.
    pub fn from_stored(day: Option<bool>, rows: &[EntryLine]) -> Self {
        match day {
            None => DayRecord::NotYetRecorded,
            Some(true) => DayRecord::Holiday,
            Some(false) => DayRecord::Entries(
                rows.iter().map(|r| ((r.customer_id, r.milk_type), r.quantity)).collect(),
            ),
        }
    }

    pub fn is_holiday(&self) -> bool {
        matches!(self, DayRecord::Holiday)
    }

    pub fn is_recorded(&self) -> bool {
        !matches!(self, DayRecord::NotYetRecorded)
    }

    pub fn customer_ids(&self) -> Vec<i64> {
        match self {
            DayRecord::Entries(entries) => {
                let mut ids: Vec<i64> = entries.keys().map(|(id, _)| *id).collect();
                ids.dedup();
                ids
            }
            _ => Vec::new(),
        }
    }

    /// Rows to persist. A holiday stores an explicit zero for every customer
    /// on the roster so that billing reads "0 delivered", not "missing".
    pub fn rows_to_store(&self, roster: &[RosterCustomer]) -> Vec<EntryLine> {
        match self {
            DayRecord::Holiday => roster
                .iter()
                .map(|c| EntryLine { customer_id: c.customer_id, milk_type: c.milk_type, quantity: 0.0 })
                .collect(),
            DayRecord::Entries(entries) => entries
                .iter()
                .map(|(&(customer_id, milk_type), &quantity)| EntryLine { customer_id, milk_type, quantity })
                .collect(),
            DayRecord::NotYetRecorded => Vec::new(),
        }
    }

    /// The sheet the home screen edits: one line per roster customer on
    /// their milk type, plus any stored line on another milk type.
    pub fn sheet(&self, roster: &[RosterCustomer]) -> Vec<SheetLine> {
        let mut lines = Vec::with_capacity(roster.len());
        for customer in roster {
            let quantity = match self {
                DayRecord::Holiday => 0.0,
                DayRecord::NotYetRecorded => customer.default_liters,
                DayRecord::Entries(entries) => entries
                    .get(&(customer.customer_id, customer.milk_type))
                    .copied()
                    .unwrap_or(0.0),
            };
            lines.push(SheetLine {
                customer_id: customer.customer_id,
                customer_name: customer.customer_name.clone(),
                milk_type: customer.milk_type,
                quantity,
            });

            if let DayRecord::Entries(entries) = self {
                for milk_type in MilkType::ALL.into_iter().filter(|t| *t != customer.milk_type) {
                    if let Some(&quantity) = entries.get(&(customer.customer_id, milk_type)) {
                        lines.push(SheetLine {
                            customer_id: customer.customer_id,
                            customer_name: customer.customer_name.clone(),
                            milk_type,
                            quantity,
                        });
                    }
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<RosterCustomer> {
        vec![
            RosterCustomer { customer_id: 1, customer_name: "Asha".into(), milk_type: MilkType::Cow, default_liters: 1.0 },
            RosterCustomer { customer_id: 2, customer_name: "Ravi".into(), milk_type: MilkType::Buffalo, default_liters: 0.5 },
        ]
    }

    fn line(customer_id: i64, milk_type: MilkType, quantity: f64) -> EntryLine {
        EntryLine { customer_id, milk_type, quantity }
    }

    #[test]
    fn unrecorded_day_offers_defaults() {
        let sheet = DayRecord::NotYetRecorded.sheet(&roster());
        let quantities: Vec<f64> = sheet.iter().map(|l| l.quantity).collect();
        assert_eq!(quantities, vec![1.0, 0.5]);
    }

    #[test]
    fn holiday_zeroes_everyone_whatever_was_submitted() {
        let submitted = [line(1, MilkType::Cow, 2.0), line(2, MilkType::Buffalo, 1.5)];
        let record = DayRecord::from_submission(true, &submitted).unwrap();
        assert!(record.is_holiday());

        let stored = record.rows_to_store(&roster());
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.quantity == 0.0));

        let reloaded = DayRecord::from_stored(Some(true), &stored);
        assert!(reloaded.is_holiday());
        assert!(reloaded.sheet(&roster()).iter().all(|l| l.quantity == 0.0));
    }

    #[test]
    fn saving_the_same_day_twice_gives_the_same_sheet() {
        let submitted = [line(1, MilkType::Cow, 2.0), line(2, MilkType::Buffalo, 1.5)];
        let first = DayRecord::from_submission(false, &submitted).unwrap();
        let second = DayRecord::from_submission(false, &submitted).unwrap();
        assert_eq!(first, second);

        let reload = |r: &DayRecord| DayRecord::from_stored(Some(false), &r.rows_to_store(&roster())).sheet(&roster());
        assert_eq!(reload(&first), reload(&second));
    }

    #[test]
    fn recorded_day_reports_zero_for_customers_left_out() {
        let record = DayRecord::from_submission(false, &[line(1, MilkType::Cow, 3.0)]).unwrap();
        let stored = record.rows_to_store(&roster());
        let sheet = DayRecord::from_stored(Some(false), &stored).sheet(&roster());
        assert_eq!(sheet[0].quantity, 3.0);
        assert_eq!(sheet[1].quantity, 0.0);
    }

    #[test]
    fn entries_on_another_milk_type_stay_visible() {
        let record = DayRecord::from_submission(
            false,
            &[line(1, MilkType::Cow, 1.0), line(1, MilkType::Buffalo, 0.5)],
        )
        .unwrap();
        let sheet = record.sheet(&roster());
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet[1].milk_type, MilkType::Buffalo);
        assert_eq!(sheet[1].customer_id, 1);
        assert_eq!(record.customer_ids(), vec![1]);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = DayRecord::from_submission(false, &[line(2, MilkType::Buffalo, -0.5)]).unwrap_err();
        assert!(matches!(err, BillingError::InvalidQuantity { customer_id: 2, .. }));
    }

    #[test]
    fn nan_quantity_is_rejected() {
        let err = DayRecord::from_submission(false, &[line(1, MilkType::Cow, f64::NAN)]).unwrap_err();
        assert!(matches!(err, BillingError::InvalidQuantity { .. }));
    }

    #[test]
    fn quantities_the_column_cannot_hold_are_rejected() {
        let third_decimal = DayRecord::from_submission(false, &[line(1, MilkType::Cow, 0.125)]).unwrap_err();
        assert!(matches!(third_decimal, BillingError::InvalidQuantity { customer_id: 1, .. }));

        let too_large = DayRecord::from_submission(false, &[line(1, MilkType::Cow, 1_000_000.0)]).unwrap_err();
        assert!(matches!(too_large, BillingError::InvalidQuantity { .. }));

        assert!(DayRecord::from_submission(false, &[line(1, MilkType::Cow, 0.25)]).is_ok());
    }

    #[test]
    fn duplicate_lines_are_rejected() {
        let err = DayRecord::from_submission(
            false,
            &[line(1, MilkType::Cow, 1.0), line(1, MilkType::Cow, 2.0)],
        )
        .unwrap_err();
        assert_eq!(err, BillingError::DuplicateEntry { customer_id: 1, milk_type: MilkType::Cow });
    }
}
