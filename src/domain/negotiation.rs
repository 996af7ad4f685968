//! Negotiation aggregate: case identifiers, financial terms, status and
//! schedule-generation flags.

use crate::domain::{Decimal, NegotiationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Case identifiers of the settled debt. The triple is unique across negotiations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    /// Court case number (processo).
    pub case_number: Option<String>,
    /// Executed party (executado).
    pub debtor: String,
    /// Contract identifier (contrato).
    pub contract: Option<String>,
}

impl CaseRef {
    pub fn new(debtor: impl Into<String>) -> Self {
        Self {
            case_number: None,
            debtor: debtor.into(),
            contract: None,
        }
    }

    pub fn with_case_number(mut self, case_number: impl Into<String>) -> Self {
        self.case_number = Some(case_number.into());
        self
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }
}

/// Down-payment (entry) terms. Every field is optional; a missing or zero
/// installment count means "no down payment".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownPaymentTerms {
    pub amount: Option<Decimal>,
    pub installment_count: Option<u32>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl DownPaymentTerms {
    /// Number of down-payment installments to generate.
    pub fn effective_count(&self) -> u32 {
        self.installment_count.unwrap_or(0)
    }
}

/// Financial terms supplied by the caller when a negotiation is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationTerms {
    pub case: CaseRef,
    /// Original debt (val_devido).
    pub amount_owed: Decimal,
    pub discount: Decimal,
    /// Negotiated amount to amortize.
    pub principal: Decimal,
    /// Monthly interest rate, in percent.
    pub monthly_rate: Decimal,
    pub installment_count: u32,
    pub first_installment_date: Option<NaiveDate>,
    pub last_installment_date: Option<NaiveDate>,
    pub down_payment: DownPaymentTerms,
    pub notes: Option<String>,
}

impl NegotiationTerms {
    /// Terms for a plain monthly schedule with no down payment.
    pub fn monthly(
        case: CaseRef,
        principal: Decimal,
        monthly_rate: Decimal,
        installment_count: u32,
        first_installment_date: NaiveDate,
    ) -> Self {
        Self {
            case,
            amount_owed: principal,
            discount: Decimal::zero(),
            principal,
            monthly_rate,
            installment_count,
            first_installment_date: Some(first_installment_date),
            last_installment_date: None,
            down_payment: DownPaymentTerms::default(),
            notes: None,
        }
    }

    pub fn with_down_payment(
        mut self,
        amount: Decimal,
        installment_count: u32,
        first_date: NaiveDate,
    ) -> Self {
        self.down_payment = DownPaymentTerms {
            amount: Some(amount),
            installment_count: Some(installment_count),
            first_date: Some(first_date),
            last_date: None,
        };
        self
    }
}

/// Legal/collection status flags carried alongside the terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationStatus {
    pub is_extrajudicial_term: bool,
    pub is_extrajudicial_homologation: bool,
    pub is_defaulted: bool,
    pub is_settled: bool,
    pub is_returned_to_enforcement: bool,
}

/// Flags gating the one-time schedule generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFlags {
    pub needs_monthly_schedule: bool,
    pub needs_down_payment_schedule: bool,
}

/// Where a negotiation stands with respect to schedule generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Created,
    MonthlyGenerated,
    DownPaymentGenerated,
    FullyGenerated,
}

impl GenerationFlags {
    /// Flags of a freshly created negotiation.
    pub fn pending() -> Self {
        Self {
            needs_monthly_schedule: true,
            needs_down_payment_schedule: true,
        }
    }

    pub fn done() -> Self {
        Self {
            needs_monthly_schedule: false,
            needs_down_payment_schedule: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.needs_monthly_schedule && !self.needs_down_payment_schedule
    }

    pub fn stage(&self) -> GenerationStage {
        match (self.needs_monthly_schedule, self.needs_down_payment_schedule) {
            (true, true) => GenerationStage::Created,
            (false, true) => GenerationStage::MonthlyGenerated,
            (true, false) => GenerationStage::DownPaymentGenerated,
            (false, false) => GenerationStage::FullyGenerated,
        }
    }
}

/// Input for creating a negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNegotiation {
    pub terms: NegotiationTerms,
    #[serde(default)]
    pub status: NegotiationStatus,
}

impl NewNegotiation {
    pub fn new(terms: NegotiationTerms) -> Self {
        Self {
            terms,
            status: NegotiationStatus::default(),
        }
    }
}

/// A persisted negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiation {
    pub id: NegotiationId,
    pub terms: NegotiationTerms,
    pub status: NegotiationStatus,
    /// Amount of each contract installment, set once the monthly schedule exists.
    pub computed_installment_amount: Decimal,
    pub flags: GenerationFlags,
}

/// Partial update of a negotiation. Unset fields are left untouched.
///
/// Generation flags and the computed installment amount are owned by the
/// post-processor and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationPatch {
    pub case_number: Option<String>,
    pub debtor: Option<String>,
    pub contract: Option<String>,
    pub amount_owed: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub principal: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub installment_count: Option<u32>,
    pub first_installment_date: Option<NaiveDate>,
    pub last_installment_date: Option<NaiveDate>,
    pub down_payment_amount: Option<Decimal>,
    pub down_payment_installment_count: Option<u32>,
    pub first_down_payment_date: Option<NaiveDate>,
    pub last_down_payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_extrajudicial_term: Option<bool>,
    pub is_extrajudicial_homologation: Option<bool>,
    pub is_defaulted: Option<bool>,
    pub is_settled: Option<bool>,
    pub is_returned_to_enforcement: Option<bool>,
}

impl NegotiationPatch {
    pub fn is_empty(&self) -> bool {
        *self == NegotiationPatch::default()
    }

    /// Apply the set fields onto `negotiation`.
    pub fn apply(self, negotiation: &mut Negotiation) {
        let terms = &mut negotiation.terms;
        let status = &mut negotiation.status;

        if let Some(v) = self.case_number {
            terms.case.case_number = Some(v);
        }
        if let Some(v) = self.debtor {
            terms.case.debtor = v;
        }
        if let Some(v) = self.contract {
            terms.case.contract = Some(v);
        }
        if let Some(v) = self.amount_owed {
            terms.amount_owed = v;
        }
        if let Some(v) = self.discount {
            terms.discount = v;
        }
        if let Some(v) = self.principal {
            terms.principal = v;
        }
        if let Some(v) = self.monthly_rate {
            terms.monthly_rate = v;
        }
        if let Some(v) = self.installment_count {
            terms.installment_count = v;
        }
        if let Some(v) = self.first_installment_date {
            terms.first_installment_date = Some(v);
        }
        if let Some(v) = self.last_installment_date {
            terms.last_installment_date = Some(v);
        }
        if let Some(v) = self.down_payment_amount {
            terms.down_payment.amount = Some(v);
        }
        if let Some(v) = self.down_payment_installment_count {
            terms.down_payment.installment_count = Some(v);
        }
        if let Some(v) = self.first_down_payment_date {
            terms.down_payment.first_date = Some(v);
        }
        if let Some(v) = self.last_down_payment_date {
            terms.down_payment.last_date = Some(v);
        }
        if let Some(v) = self.notes {
            terms.notes = Some(v);
        }
        if let Some(v) = self.is_extrajudicial_term {
            status.is_extrajudicial_term = v;
        }
        if let Some(v) = self.is_extrajudicial_homologation {
            status.is_extrajudicial_homologation = v;
        }
        if let Some(v) = self.is_defaulted {
            status.is_defaulted = v;
        }
        if let Some(v) = self.is_settled {
            status.is_settled = v;
        }
        if let Some(v) = self.is_returned_to_enforcement {
            status.is_returned_to_enforcement = v;
        }
    }
}
