//! Pure schedule computation: annuity amortization, down-payment split and
//! due-date arithmetic. Nothing here touches storage.

use crate::domain::{InstallmentError, InstallmentKind, NegotiationTerms};
use thiserror::Error;

pub mod amortization;
pub mod calendar;
pub mod down_payment;
pub mod schedule;

pub use amortization::{compute_installment_amount, generate_monthly_schedule};
pub use down_payment::{generate_down_payment_schedule, per_installment_amount};
pub use schedule::Schedule;

/// Upper bound on the entries of one schedule (100 years of monthly payments).
pub const MAX_INSTALLMENT_COUNT: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Inputs the calculation cannot accept. Raised before anything is persisted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{kind} installment {sequence_number}: due date out of range")]
    DateOverflow {
        kind: InstallmentKind,
        sequence_number: u32,
    },
    #[error(transparent)]
    InvalidInstallment(#[from] InstallmentError),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }
}

pub(crate) fn check_installment_count(count: u32, what: &str) -> Result<(), EngineError> {
    if count > MAX_INSTALLMENT_COUNT {
        return Err(EngineError::invalid(format!(
            "{} must not exceed {}, got {}",
            what, MAX_INSTALLMENT_COUNT, count
        )));
    }
    Ok(())
}

/// Check caller-supplied terms before a negotiation is stored.
///
/// Runs both schedule builders, so anything that would make generation fail
/// with `InvalidArgument` is caught here.
///
/// # Errors
/// Returns `InvalidArgument` describing the first problem found.
pub fn validate_terms(terms: &NegotiationTerms) -> Result<(), EngineError> {
    if terms.case.debtor.trim().is_empty() {
        return Err(EngineError::invalid("debtor is required"));
    }
    if terms.discount.is_negative() {
        return Err(EngineError::invalid(format!(
            "discount must not be negative, got {}",
            terms.discount
        )));
    }
    if terms.amount_owed.is_negative() {
        return Err(EngineError::invalid(format!(
            "amount owed must not be negative, got {}",
            terms.amount_owed
        )));
    }
    generate_monthly_schedule(terms)?;
    generate_down_payment_schedule(terms)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseRef, Decimal};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn terms() -> NegotiationTerms {
        NegotiationTerms::monthly(
            CaseRef::new("ACME"),
            Decimal::from_str("1000").unwrap(),
            Decimal::from_str("1").unwrap(),
            5,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn test_valid_terms() {
        assert!(validate_terms(&terms()).is_ok());
    }

    #[test]
    fn test_blank_debtor_rejected() {
        let mut t = terms();
        t.case.debtor = "  ".to_string();
        assert!(matches!(validate_terms(&t), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut t = terms();
        t.discount = Decimal::from_str("-1").unwrap();
        assert!(matches!(validate_terms(&t), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_schedule_errors_surface() {
        let mut t = terms();
        t.installment_count = 0;
        assert!(matches!(validate_terms(&t), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::DateOverflow {
            kind: InstallmentKind::DownPayment,
            sequence_number: 4,
        };
        assert_eq!(err.to_string(), "down_payment installment 4: due date out of range");
    }
}
