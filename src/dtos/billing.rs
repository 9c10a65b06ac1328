use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::period::BillingPeriod;
use crate::billing::reconcile::Standing;
use crate::models::bill_payment::BillPayment;

/// `current_bill` and `previous_pending` are the figures the operator was
/// shown; they are checked against a fresh computation before saving.
#[derive(Debug, Deserialize)]
pub struct SaveBillPaymentRequest {
    pub customer_id: i64,
    pub current_bill: f64,
    pub previous_pending: f64,
    pub amount_paid: f64,
    pub billing_period: BillingPeriod,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: BillPayment,
    pub standing: Standing,
}

impl From<BillPayment> for PaymentResponse {
    fn from(payment: BillPayment) -> Self {
        Self { standing: Standing::of(payment.pending_after), payment }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub customer_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
