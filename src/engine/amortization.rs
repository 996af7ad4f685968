//! Fixed-payment (annuity) amortization of the negotiated principal.

use super::schedule::Schedule;
use super::{check_installment_count, EngineError};
use crate::domain::{Decimal, InstallmentKind, NegotiationTerms};
use rust_decimal::{Decimal as RustDecimal, MathematicalOps};

/// Fixed monthly installment that amortizes `principal` over `periods` months.
///
/// The rate is a percentage (2 means 2% a month). A zero rate splits the
/// principal evenly; otherwise the annuity formula
/// `P * r(1+r)^n / ((1+r)^n - 1)` is evaluated in decimal arithmetic.
/// The result is rounded to cents, ties to even.
///
/// # Errors
/// Returns `InvalidArgument` when `principal <= 0`, `periods` is outside
/// `1..=MAX_INSTALLMENT_COUNT`, the rate is negative, or the intermediate
/// powers overflow.
pub fn compute_installment_amount(
    principal: Decimal,
    monthly_rate_percent: Decimal,
    periods: u32,
) -> Result<Decimal, EngineError> {
    if !principal.is_positive() {
        return Err(EngineError::invalid(format!(
            "principal must be positive, got {}",
            principal
        )));
    }
    if periods < 1 {
        return Err(EngineError::invalid("installment count must be at least 1"));
    }
    check_installment_count(periods, "installment count")?;
    if monthly_rate_percent.is_negative() {
        return Err(EngineError::invalid(format!(
            "monthly rate must not be negative, got {}",
            monthly_rate_percent
        )));
    }

    let principal = principal.inner();
    let rate = monthly_rate_percent.inner() / RustDecimal::ONE_HUNDRED;

    if rate.is_zero() {
        let flat = principal / RustDecimal::from(periods);
        return Ok(Decimal::new(flat).round_money());
    }

    let overflow = || EngineError::invalid("installment amount out of range");
    let growth = (RustDecimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(overflow)?;
    let numerator = rate
        .checked_mul(growth)
        .and_then(|v| v.checked_mul(principal))
        .ok_or_else(overflow)?;
    let payment = numerator
        .checked_div(growth - RustDecimal::ONE)
        .ok_or_else(overflow)?;

    Ok(Decimal::new(payment).round_money())
}

/// Contract schedule of a negotiation: `installment_count` equal installments,
/// the first due the day after `first_installment_date`, then monthly.
///
/// # Errors
/// Returns `InvalidArgument` for invalid amortization inputs or a missing first date.
pub fn generate_monthly_schedule(terms: &NegotiationTerms) -> Result<Schedule, EngineError> {
    let amount = compute_installment_amount(
        terms.principal,
        terms.monthly_rate,
        terms.installment_count,
    )?;
    let first_date = terms
        .first_installment_date
        .ok_or_else(|| EngineError::invalid("first installment date is required"))?;

    Ok(Schedule::new(
        InstallmentKind::Contract,
        amount,
        terms.installment_count,
        first_date,
    ))
}
