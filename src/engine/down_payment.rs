//! Down-payment (entry) schedule: the entry amount split evenly across its own
//! installment count.

use super::schedule::Schedule;
use super::{check_installment_count, EngineError, MAX_INSTALLMENT_COUNT};
use crate::domain::{Decimal, InstallmentKind, NegotiationTerms};

/// Even split of the entry amount, rounded to cents (ties to even), the same
/// rounding the contract installments use.
///
/// # Errors
/// Returns `InvalidArgument` when `count` is zero.
pub fn per_installment_amount(total: Decimal, count: u32) -> Result<Decimal, EngineError> {
    total
        .checked_div(Decimal::from(count))
        .map(|amount| amount.round_money())
        .ok_or_else(|| EngineError::invalid("down payment installment count must be positive"))
}

/// Down-payment schedule of a negotiation.
///
/// A missing or zero installment count is the "no down payment" case and
/// yields an empty schedule.
///
/// # Errors
/// Returns `InvalidArgument` when installments are requested without a positive
/// amount or without a first date, or when the count exceeds
/// `MAX_INSTALLMENT_COUNT`.
pub fn generate_down_payment_schedule(terms: &NegotiationTerms) -> Result<Schedule, EngineError> {
    let down_payment = &terms.down_payment;
    let count = down_payment.effective_count();
    if count == 0 {
        return Ok(Schedule::empty(InstallmentKind::DownPayment));
    }
    check_installment_count(count, "down payment installment count")?;

    let total = down_payment
        .amount
        .ok_or_else(|| EngineError::invalid("down payment amount is required"))?;
    if !total.is_positive() {
        return Err(EngineError::invalid(format!(
            "down payment amount must be positive, got {}",
            total
        )));
    }
    let first_date = down_payment
        .first_date
        .ok_or_else(|| EngineError::invalid("first down payment date is required"))?;

    let amount = per_installment_amount(total, count)?;
    Ok(Schedule::new(InstallmentKind::DownPayment, amount, count, first_date))
}
