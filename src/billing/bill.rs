use serde::Serialize;

use super::rate::{resolve_rate, CustomerRates, MasterRates};
use super::reconcile::total_due;
use super::{round_currency, BillingError, MilkType};

/// Liters delivered to one customer over a period, per milk type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeTally {
    pub cow_liters: f64,
    pub buffalo_liters: f64,
}

impl VolumeTally {
    pub fn add(&mut self, milk_type: MilkType, liters: f64) {
        match milk_type {
            MilkType::Cow => self.cow_liters += liters,
            MilkType::Buffalo => self.buffalo_liters += liters,
        }
    }

    pub fn liters(&self, milk_type: MilkType) -> f64 {
        match milk_type {
            MilkType::Cow => self.cow_liters,
            MilkType::Buffalo => self.buffalo_liters,
        }
    }
}

impl FromIterator<(MilkType, f64)> for VolumeTally {
    fn from_iter<I: IntoIterator<Item = (MilkType, f64)>>(iter: I) -> Self {
        let mut tally = VolumeTally::default();
        for (milk_type, liters) in iter {
            tally.add(milk_type, liters);
        }
        tally
    }
}

/// Unrounded amount owed per milk type. Types with no liters are not priced,
/// so an unused milk type never needs a rate.
pub fn price_by_type(
    rates: &CustomerRates,
    master: &MasterRates,
    tally: &VolumeTally,
) -> Result<Vec<(MilkType, f64)>, BillingError> {
    let mut priced = Vec::with_capacity(MilkType::ALL.len());
    for milk_type in MilkType::ALL {
        let liters = tally.liters(milk_type);
        if liters == 0.0 {
            continue;
        }
        let rate = resolve_rate(rates, master, milk_type)?;
        priced.push((milk_type, rate * liters));
    }
    Ok(priced)
}

/// `rate × Σ quantity` per milk type, with the current rate.
pub fn compute_bill(
    rates: &CustomerRates,
    master: &MasterRates,
    tally: &VolumeTally,
) -> Result<f64, BillingError> {
    let total: f64 = price_by_type(rates, master, tally)?.iter().map(|(_, amount)| amount).sum();
    Ok(round_currency(total))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BillFigures {
    /// Bill for every liter in the period.
    pub gross_bill: f64,
    /// Part of `gross_bill` already folded into pending by earlier payments
    /// for periods inside this one.
    pub already_billed: f64,
    pub current_bill: f64,
    pub pending_amount: f64,
    pub total_due: f64,
}

impl BillFigures {
    pub fn new(gross_bill: f64, already_billed: f64, pending_amount: f64) -> Self {
        let current_bill = round_currency(gross_bill - already_billed);
        Self {
            gross_bill,
            already_billed,
            current_bill,
            pending_amount,
            total_due: total_due(current_bill, pending_amount),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.current_bill == 0.0 && self.pending_amount == 0.0
    }
}
