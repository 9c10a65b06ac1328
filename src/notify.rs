//! Hand-off point for bill notices.
//!
//! Building and sending the actual WhatsApp message belongs to an outside
//! service. The billing state is already committed when a notice is
//! dispatched, so a failed delivery is logged and reported, never rolled back.

use serde::Serialize;
use thiserror::Error;

use crate::billing::bill::BillFigures;
use crate::billing::period::DateRange;

#[derive(Debug, Clone, Serialize)]
pub struct BillNotice {
    pub dairy_name: Option<String>,
    pub customer_id: i64,
    pub customer_name: String,
    pub whatsapp_no: String,
    pub period: DateRange,
    pub figures: BillFigures,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("cannot send to {0:?}: not a 10 digit WhatsApp number")]
    InvalidRecipient(String),
}

pub trait BillNotifier: Send + Sync {
    fn deliver(&self, notice: &BillNotice) -> Result<(), NotifyError>;
}

/// Writes notices to the log. Used until a messaging provider is wired in.
pub struct LogNotifier;

impl BillNotifier for LogNotifier {
    fn deliver(&self, notice: &BillNotice) -> Result<(), NotifyError> {
        let recipient = &notice.whatsapp_no;
        if recipient.len() != 10 || !recipient.chars().all(|c| c.is_ascii_digit()) {
            return Err(NotifyError::InvalidRecipient(recipient.clone()));
        }
        tracing::info!(
            customer_id = notice.customer_id,
            whatsapp_no = %notice.whatsapp_no,
            start = %notice.period.start_date,
            end = %notice.period.end_date,
            total_due = notice.figures.total_due,
            "Bill notice queued"
        );
        Ok(())
    }
}

/// Returns whether the notice was handed over.
pub fn dispatch(notifier: &dyn BillNotifier, notice: &BillNotice) -> bool {
    match notifier.deliver(notice) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(customer_id = notice.customer_id, error = %e, "Bill notice not delivered");
            false
        }
    }
}
