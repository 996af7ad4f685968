//! Domain types for the negotiation billing module.
//!
//! This module provides:
//! - Lossless monetary handling via the Decimal wrapper
//! - Identifiers and the installment kind
//! - The Negotiation aggregate, its terms and generation flags
//! - Installment rows and payment patches
//! - Offset pagination

pub mod decimal;
pub mod installment;
pub mod negotiation;
pub mod page;
pub mod primitives;

pub use decimal::Decimal;
pub use installment::{
    Installment, InstallmentError, InstallmentPatch, NewInstallment, ScheduledInstallment,
};
pub use negotiation::{
    CaseRef, DownPaymentTerms, GenerationFlags, GenerationStage, Negotiation, NegotiationPatch,
    NegotiationStatus, NegotiationTerms, NewNegotiation,
};
pub use page::{Page, Paged};
pub use primitives::{InstallmentId, InstallmentKind, NegotiationId};
