//! Installment rows: one scheduled payment obligation of a negotiation.

use crate::domain::{Decimal, InstallmentId, InstallmentKind, NegotiationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a single installment cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallmentError {
    #[error("installment {sequence_number} amount must be positive, got {amount}")]
    NonPositiveAmount { sequence_number: u32, amount: Decimal },
    #[error("installment sequence numbers start at 1")]
    ZeroSequenceNumber,
}

/// A computed schedule entry, not yet attached to a negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub kind: InstallmentKind,
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

impl ScheduledInstallment {
    /// Build an entry, enforcing a 1-based sequence number and a positive amount.
    pub fn new(
        kind: InstallmentKind,
        sequence_number: u32,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> Result<Self, InstallmentError> {
        if sequence_number == 0 {
            return Err(InstallmentError::ZeroSequenceNumber);
        }
        if !amount.is_positive() {
            return Err(InstallmentError::NonPositiveAmount {
                sequence_number,
                amount,
            });
        }
        Ok(Self {
            kind,
            sequence_number,
            due_date,
            amount,
        })
    }

    pub fn for_negotiation(self, negotiation_id: NegotiationId) -> NewInstallment {
        NewInstallment {
            negotiation_id,
            kind: self.kind,
            sequence_number: self.sequence_number,
            due_date: self.due_date,
            amount: self.amount,
        }
    }
}

/// An installment ready to be saved. Stored unpaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallment {
    pub negotiation_id: NegotiationId,
    pub kind: InstallmentKind,
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// A persisted installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub negotiation_id: NegotiationId,
    pub kind: InstallmentKind,
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid_amount: Option<Decimal>,
    pub paid_date: Option<NaiveDate>,
    pub payment_notes: Option<String>,
    pub is_paid: bool,
    /// Set when the paid amount included late-payment interest.
    pub is_interest_adjusted: bool,
}

impl Installment {
    /// The row a freshly saved `NewInstallment` becomes.
    pub fn unpaid(id: InstallmentId, new: &NewInstallment) -> Self {
        Self {
            id,
            negotiation_id: new.negotiation_id,
            kind: new.kind,
            sequence_number: new.sequence_number,
            due_date: new.due_date,
            amount: new.amount,
            paid_amount: None,
            paid_date: None,
            payment_notes: None,
            is_paid: false,
            is_interest_adjusted: false,
        }
    }
}

/// Payment registration on an installment. Unset fields are left untouched.
///
/// Schedule fields (kind, sequence number, due date, amount) are not patchable
/// so the per-schedule numbering and date ordering cannot be broken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallmentPatch {
    pub paid_amount: Option<Decimal>,
    pub paid_date: Option<NaiveDate>,
    pub payment_notes: Option<String>,
    pub is_paid: Option<bool>,
    pub is_interest_adjusted: Option<bool>,
}

impl InstallmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == InstallmentPatch::default()
    }

    pub fn apply(self, installment: &mut Installment) {
        if let Some(v) = self.paid_amount {
            installment.paid_amount = Some(v);
        }
        if let Some(v) = self.paid_date {
            installment.paid_date = Some(v);
        }
        if let Some(v) = self.payment_notes {
            installment.payment_notes = Some(v);
        }
        if let Some(v) = self.is_paid {
            installment.is_paid = v;
        }
        if let Some(v) = self.is_interest_adjusted {
            installment.is_interest_adjusted = v;
        }
    }
}
