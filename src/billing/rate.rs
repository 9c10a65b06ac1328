use std::fmt;

use serde::{Deserialize, Serialize};

use super::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "milk_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MilkType {
    Cow,
    Buffalo,
}

impl MilkType {
    pub const ALL: [MilkType; 2] = [MilkType::Cow, MilkType::Buffalo];

    pub fn as_str(&self) -> &'static str {
        match self {
            MilkType::Cow => "cow",
            MilkType::Buffalo => "buffalo",
        }
    }
}

impl fmt::Display for MilkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dairy-wide default rates (₹/liter). `None` means never configured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MasterRates {
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
}

impl MasterRates {
    pub fn new(cow_rate: f64, buffalo_rate: f64) -> Self {
        Self { cow_rate: Some(cow_rate), buffalo_rate: Some(buffalo_rate) }
    }

    pub fn for_type(&self, milk_type: MilkType) -> Option<f64> {
        match milk_type {
            MilkType::Cow => self.cow_rate,
            MilkType::Buffalo => self.buffalo_rate,
        }
    }
}

/// The rate-related part of a customer record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerRates {
    pub use_master_rate: bool,
    pub cow_rate: Option<f64>,
    pub buffalo_rate: Option<f64>,
}

impl CustomerRates {
    #[cfg(test)]
    pub fn master() -> Self {
        Self { use_master_rate: true, cow_rate: None, buffalo_rate: None }
    }

    /// A zero or negative override counts as unset.
    pub fn override_for(&self, milk_type: MilkType) -> Option<f64> {
        let rate = match milk_type {
            MilkType::Cow => self.cow_rate,
            MilkType::Buffalo => self.buffalo_rate,
        };
        rate.filter(|r| *r > 0.0)
    }
}

/// Current rate for `milk_type`. There is no rate history: a master-rate
/// edit changes every bill computed afterwards, including past periods.
pub fn resolve_rate(
    customer: &CustomerRates,
    master: &MasterRates,
    milk_type: MilkType,
) -> Result<f64, BillingError> {
    let rate = if customer.use_master_rate {
        master.for_type(milk_type)
    } else {
        customer.override_for(milk_type).or_else(|| master.for_type(milk_type))
    };
    rate.ok_or(BillingError::MissingRate(milk_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_rate_customers_ignore_their_overrides() {
        let customer = CustomerRates { use_master_rate: true, cow_rate: Some(70.0), buffalo_rate: None };
        let master = MasterRates::new(55.0, 65.0);
        assert_eq!(resolve_rate(&customer, &master, MilkType::Cow).unwrap(), 55.0);
    }

    #[test]
    fn override_applies_when_master_rate_is_off() {
        let customer = CustomerRates { use_master_rate: false, cow_rate: Some(58.0), buffalo_rate: None };
        let master = MasterRates::new(55.0, 65.0);
        assert_eq!(resolve_rate(&customer, &master, MilkType::Cow).unwrap(), 58.0);
        // no buffalo override: falls back to master
        assert_eq!(resolve_rate(&customer, &master, MilkType::Buffalo).unwrap(), 65.0);
    }

    #[test]
    fn zero_override_falls_back_to_master() {
        let customer = CustomerRates { use_master_rate: false, cow_rate: Some(0.0), buffalo_rate: None };
        let master = MasterRates::new(55.0, 65.0);
        assert_eq!(resolve_rate(&customer, &master, MilkType::Cow).unwrap(), 55.0);
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let err = resolve_rate(&CustomerRates::master(), &MasterRates::default(), MilkType::Buffalo).unwrap_err();
        assert_eq!(err, BillingError::MissingRate(MilkType::Buffalo));
    }

    #[test]
    fn master_rate_edit_is_picked_up_immediately() {
        let customer = CustomerRates::master();
        let mut master = MasterRates::new(55.0, 65.0);
        assert_eq!(resolve_rate(&customer, &master, MilkType::Cow).unwrap(), 55.0);
        master.cow_rate = Some(60.0);
        assert_eq!(resolve_rate(&customer, &master, MilkType::Cow).unwrap(), 60.0);
    }

    #[test]
    fn milk_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MilkType::Buffalo).unwrap(), "\"buffalo\"");
        let parsed: MilkType = serde_json::from_str("\"cow\"").unwrap();
        assert_eq!(parsed, MilkType::Cow);
    }
}
