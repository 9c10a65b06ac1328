use serde::{Deserialize, Serialize};

use super::period::{PeriodRequest, PeriodResponse};
use crate::billing::bill::BillFigures;
use crate::billing::period::DateRange;
use crate::billing::reconcile::Standing;
use crate::billing::{round_currency, MilkType};
use crate::models::statement::Statement;

#[derive(Debug, Serialize)]
pub struct CustomerBillLine {
    pub customer_id: i64,
    pub customer_name: String,
    pub whatsapp_no: Option<String>,
    pub milk_type: MilkType,
    pub archived: bool,
    pub cow_liters: f64,
    pub buffalo_liters: f64,
    #[serde(flatten)]
    pub figures: BillFigures,
    pub standing: Standing,
    /// Payments for periods only partly inside the report. Non-zero means
    /// `current_bill` may count liters a payment already settled.
    pub overlapping_payments: i64,
}

impl From<Statement> for CustomerBillLine {
    fn from(s: Statement) -> Self {
        Self {
            customer_id: s.customer.id,
            archived: s.customer.is_archived(),
            customer_name: s.customer.customer_name,
            whatsapp_no: s.customer.whatsapp_no,
            milk_type: s.customer.milk_type,
            cow_liters: s.tally.cow_liters,
            buffalo_liters: s.tally.buffalo_liters,
            standing: Standing::of(s.figures.total_due),
            figures: s.figures,
            overlapping_payments: s.overlapping_payments,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BillTotals {
    pub current_bill: f64,
    pub pending_amount: f64,
    pub total_due: f64,
}

impl<'a> FromIterator<&'a CustomerBillLine> for BillTotals {
    fn from_iter<I: IntoIterator<Item = &'a CustomerBillLine>>(iter: I) -> Self {
        let mut totals = iter.into_iter().fold(BillTotals::default(), |mut t, line| {
            t.current_bill += line.figures.current_bill;
            t.pending_amount += line.figures.pending_amount;
            t.total_due += line.figures.total_due;
            t
        });
        totals.current_bill = round_currency(totals.current_bill);
        totals.pending_amount = round_currency(totals.pending_amount);
        totals.total_due = round_currency(totals.total_due);
        totals
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerBillsResponse {
    pub period: PeriodResponse,
    pub customers: Vec<CustomerBillLine>,
    pub totals: BillTotals,
}

/// Without a selection, or without a body at all, the notice covers the
/// previous calendar month.
#[derive(Debug, Deserialize)]
pub struct SendBillRequest {
    pub selection: Option<PeriodRequest>,
}

#[derive(Debug, Serialize)]
pub struct SendBillResponse {
    pub customer_id: i64,
    pub period: DateRange,
    pub figures: BillFigures,
    pub overlapping_payments: i64,
    pub delivered: bool,
}
