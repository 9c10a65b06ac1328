//! Pending-balance arithmetic.
//!
//! Sign convention: positive pending means the customer owes the dairy,
//! negative means the customer has credit.

use serde::Serialize;
use thiserror::Error;

use super::bill::BillFigures;
use super::{fits_column, round_currency, same_amount, BillingError, MAX_AMOUNT};

pub fn total_due(current_bill: f64, pending_amount: f64) -> f64 {
    round_currency(current_bill + pending_amount)
}

pub fn pending_after(current_bill: f64, previous_pending: f64, amount_paid: f64) -> Result<f64, BillingError> {
    if amount_paid < 0.0 || !fits_column(amount_paid, MAX_AMOUNT) {
        return Err(BillingError::InvalidAmount(amount_paid));
    }
    Ok(round_currency(total_due(current_bill, previous_pending) - amount_paid))
}

/// A figure the operator saw that no longer matches the server's.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StaleFigure {
    #[error("Bill changed since it was shown: expected {shown:.2}, now {actual:.2}")]
    Bill { shown: f64, actual: f64 },
    #[error("Pending balance changed since it was shown: expected {shown:.2}, now {actual:.2}")]
    Pending { shown: f64, actual: f64 },
}

/// Checks the bill and pending a payment was taken against.
pub fn confirm_shown(shown_bill: f64, shown_pending: f64, figures: &BillFigures) -> Result<(), StaleFigure> {
    if !same_amount(figures.current_bill, shown_bill) {
        return Err(StaleFigure::Bill { shown: shown_bill, actual: figures.current_bill });
    }
    if !same_amount(figures.pending_amount, shown_pending) {
        return Err(StaleFigure::Pending { shown: shown_pending, actual: figures.pending_amount });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Owes,
    Settled,
    Credit,
}

impl Standing {
    pub fn of(pending_amount: f64) -> Self {
        if same_amount(pending_amount, 0.0) {
            Standing::Settled
        } else if pending_amount > 0.0 {
            Standing::Owes
        } else {
            Standing::Credit
        }
    }
}

/// One stored payment as far as the balance is concerned.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct LedgerDelta {
    pub current_bill: f64,
    pub amount_paid: f64,
}

/// Pending balance implied by the opening balance and every payment since.
pub fn replay(opening_balance: f64, history: &[LedgerDelta]) -> f64 {
    let net: f64 = history.iter().map(|d| d.current_bill - d.amount_paid).sum();
    round_currency(opening_balance + net)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceAudit {
    pub cached_pending: f64,
    pub recomputed_pending: f64,
    pub drift: f64,
    pub in_balance: bool,
}

pub fn audit(opening_balance: f64, cached_pending: f64, history: &[LedgerDelta]) -> BalanceAudit {
    let recomputed_pending = replay(opening_balance, history);
    BalanceAudit {
        cached_pending,
        recomputed_pending,
        drift: round_currency(cached_pending - recomputed_pending),
        in_balance: same_amount(cached_pending, recomputed_pending),
    }
}
