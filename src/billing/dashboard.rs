use serde::Serialize;

use super::{round_currency, MilkType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MilkFigures {
    pub cow_liters: f64,
    pub cow_amount: f64,
    pub buffalo_liters: f64,
    pub buffalo_amount: f64,
}

impl MilkFigures {
    pub fn add(&mut self, milk_type: MilkType, liters: f64, amount: f64) {
        match milk_type {
            MilkType::Cow => {
                self.cow_liters += liters;
                self.cow_amount += amount;
            }
            MilkType::Buffalo => {
                self.buffalo_liters += liters;
                self.buffalo_amount += amount;
            }
        }
    }

    pub fn total_amount(&self) -> f64 {
        self.cow_amount + self.buffalo_amount
    }

    fn rounded(self) -> Self {
        Self {
            cow_liters: round_currency(self.cow_liters),
            cow_amount: round_currency(self.cow_amount),
            buffalo_liters: round_currency(self.buffalo_liters),
            buffalo_amount: round_currency(self.buffalo_amount),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub purchased_milk: MilkFigures,
    pub sold_milk: MilkFigures,
    pub profit: f64,
}

impl DashboardSummary {
    pub fn new(purchased_milk: MilkFigures, sold_milk: MilkFigures) -> Self {
        let profit = round_currency(sold_milk.total_amount() - purchased_milk.total_amount());
        Self { purchased_milk: purchased_milk.rounded(), sold_milk: sold_milk.rounded(), profit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyVolume {
    pub month: u32,
    pub cow_liters: f64,
    pub buffalo_liters: f64,
}

/// Twelve rows, January first; months without deliveries are zero.
pub fn monthly_series(rows: impl IntoIterator<Item = (u32, MilkType, f64)>) -> Vec<MonthlyVolume> {
    let mut series: Vec<MonthlyVolume> = (1..=12)
        .map(|month| MonthlyVolume { month, cow_liters: 0.0, buffalo_liters: 0.0 })
        .collect();
    for (month, milk_type, liters) in rows {
        let Some(slot) = series.get_mut(month.wrapping_sub(1) as usize) else {
            continue;
        };
        match milk_type {
            MilkType::Cow => slot.cow_liters += liters,
            MilkType::Buffalo => slot.buffalo_liters += liters,
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_is_sales_minus_purchases() {
        let mut purchased = MilkFigures::default();
        purchased.add(MilkType::Cow, 100.0, 4000.0);
        let mut sold = MilkFigures::default();
        sold.add(MilkType::Cow, 90.0, 4950.0);
        sold.add(MilkType::Buffalo, 10.0, 650.0);

        let summary = DashboardSummary::new(purchased, sold);
        assert_eq!(summary.profit, 1600.0);
        assert_eq!(summary.sold_milk.buffalo_liters, 10.0);
    }

    #[test]
    fn buying_more_than_selling_is_a_loss() {
        let mut purchased = MilkFigures::default();
        purchased.add(MilkType::Buffalo, 50.0, 3000.0);
        let summary = DashboardSummary::new(purchased, MilkFigures::default());
        assert_eq!(summary.profit, -3000.0);
    }

    #[test]
    fn monthly_series_fills_every_month() {
        let series = monthly_series([(3, MilkType::Cow, 31.0), (3, MilkType::Buffalo, 15.5), (12, MilkType::Cow, 2.0)]);
        assert_eq!(series.len(), 12);
        assert_eq!(series[2].cow_liters, 31.0);
        assert_eq!(series[2].buffalo_liters, 15.5);
        assert_eq!(series[11].cow_liters, 2.0);
        assert_eq!(series[0].cow_liters, 0.0);
    }

    #[test]
    fn out_of_range_months_are_ignored() {
        let series = monthly_series([(0, MilkType::Cow, 1.0), (13, MilkType::Cow, 1.0)]);
        assert!(series.iter().all(|m| m.cow_liters == 0.0));
    }
}
