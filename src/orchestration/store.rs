//! Persistence seam used by the post-processor.
//!
//! A generation run happens inside one `GenerationSession`: either every
//! surviving installment and the flag update are committed together, or the
//! session is rolled back and the negotiation keeps its pending flags.

use crate::domain::{Decimal, GenerationFlags, Installment, NegotiationId, NewInstallment};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("negotiation {0} not found")]
    MissingNegotiation(NegotiationId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("installment rejected: {0}")]
    Rejected(String),
}

/// Result of a generation run written back onto the negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationUpdate {
    /// Set when the contract schedule was generated in this run.
    pub computed_installment_amount: Option<Decimal>,
    pub flags: GenerationFlags,
}

/// Opens generation sessions.
#[async_trait]
pub trait InstallmentStore: Send + Sync {
    async fn begin_generation(&self) -> Result<Box<dyn GenerationSession>, StoreError>;
}

/// One logical unit of schedule persistence.
#[async_trait]
pub trait GenerationSession: Send {
    /// Current generation flags of the stored negotiation, read inside the session.
    async fn load_flags(&mut self, id: NegotiationId) -> Result<Option<GenerationFlags>, StoreError>;

    /// Save one installment. A failure affects only this row; the session stays usable.
    async fn save_installment(&mut self, installment: &NewInstallment) -> Result<Installment, StoreError>;

    async fn store_generation_result(
        &mut self,
        id: NegotiationId,
        update: &GenerationUpdate,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
