//! Entry points used by the application layer. Creating a negotiation is the
//! trigger point for schedule generation.

use super::post_processor::{NegotiationPostProcessor, ProcessReport};
use crate::config::Config;
use crate::db::repo::is_unique_violation;
use crate::db::Repository;
use crate::domain::{
    GenerationFlags, Installment, InstallmentId, InstallmentKind, InstallmentPatch, Negotiation,
    NegotiationId, NegotiationPatch, NewNegotiation, Page, Paged,
};
use crate::engine::validate_terms;
use crate::error::ServiceError;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A stored negotiation together with the outcome of its schedule generation.
#[derive(Debug, Clone)]
pub struct CreatedNegotiation {
    pub negotiation: Negotiation,
    /// `None` when generation failed as a whole; the flags are still set and
    /// `retry_generation` can be called later.
    pub generation: Option<ProcessReport>,
}

/// Outcome of a sweep over negotiations left with pending schedules.
#[derive(Debug, Default)]
pub struct GenerationSweep {
    pub reports: Vec<ProcessReport>,
    pub failed: Vec<NegotiationId>,
}

#[derive(Clone)]
pub struct NegotiationService {
    repo: Arc<Repository>,
    post_processor: NegotiationPostProcessor,
    config: Config,
}

impl NegotiationService {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let post_processor = NegotiationPostProcessor::new(repo.clone());
        Self {
            repo,
            post_processor,
            config,
        }
    }

    /// Store a negotiation and generate its schedules.
    ///
    /// Invalid terms are rejected before anything is stored. Once the row is
    /// stored the call succeeds even if generation fails; the failure is logged
    /// and reported through `CreatedNegotiation::generation`.
    ///
    /// # Errors
    /// `InvalidArgument` for rejected terms, `Conflict` when the case triple is
    /// already registered, `Db` when the insert fails.
    pub async fn create(&self, new: NewNegotiation) -> Result<CreatedNegotiation, ServiceError> {
        validate_terms(&new.terms)?;

        if self
            .repo
            .find_negotiation_by_case(&new.terms.case)
            .await?
            .is_some()
        {
            return Err(conflict());
        }

        let mut negotiation = self
            .repo
            .insert_negotiation(&new, GenerationFlags::pending())
            .await
            .map_err(map_unique_violation)?;
        info!(negotiation_id = %negotiation.id, debtor = %negotiation.terms.case.debtor, "Negotiation created");

        let generation = match self.post_processor.process(&mut negotiation).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(negotiation_id = %negotiation.id, error = %e, "Schedule generation failed");
                None
            }
        };

        Ok(CreatedNegotiation {
            negotiation,
            generation,
        })
    }

    /// Run generation again for a negotiation whose earlier run failed.
    /// A negotiation whose schedules already exist yields a no-op report.
    ///
    /// # Errors
    /// `NotFound` when the negotiation does not exist, `Generation` when the run fails.
    pub async fn retry_generation(&self, id: NegotiationId) -> Result<ProcessReport, ServiceError> {
        let mut negotiation = self.require_negotiation(id).await?;
        Ok(self.post_processor.process(&mut negotiation).await?)
    }

    /// Retry every negotiation that still has a pending schedule.
    ///
    /// # Errors
    /// Returns an error only if the pending negotiations cannot be listed.
    pub async fn complete_pending_generation(&self) -> Result<GenerationSweep, ServiceError> {
        let mut sweep = GenerationSweep::default();
        for id in self.repo.list_pending_generation().await? {
            match self.retry_generation(id).await {
                Ok(report) => sweep.reports.push(report),
                Err(e) => {
                    warn!(negotiation_id = %id, error = %e, "Pending generation still failing");
                    sweep.failed.push(id);
                }
            }
        }
        Ok(sweep)
    }

    pub async fn get(&self, id: NegotiationId) -> Result<Negotiation, ServiceError> {
        self.require_negotiation(id).await
    }

    /// Search by case number, debtor or contract, newest first.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Option<Page>,
    ) -> Result<Paged<Negotiation>, ServiceError> {
        Ok(self.repo.list_negotiations(search, self.page(page)).await?)
    }

    /// Apply a partial update. Schedules already generated are not recomputed.
    ///
    /// # Errors
    /// `NotFound`, `InvalidArgument` when the patched terms are invalid, or
    /// `Conflict` when the new case triple is taken.
    pub async fn update(
        &self,
        id: NegotiationId,
        patch: NegotiationPatch,
    ) -> Result<Negotiation, ServiceError> {
        let mut negotiation = self.require_negotiation(id).await?;
        if patch.is_empty() {
            return Ok(negotiation);
        }

        patch.apply(&mut negotiation);
        validate_terms(&negotiation.terms)?;

        self.repo
            .update_negotiation(&negotiation)
            .await
            .map_err(map_unique_violation)?;
        self.require_negotiation(id).await
    }

    /// Delete a negotiation and, through the cascade, its installments.
    pub async fn delete(&self, id: NegotiationId) -> Result<(), ServiceError> {
        if !self.repo.delete_negotiation(id).await? {
            return Err(negotiation_not_found(id));
        }
        info!(negotiation_id = %id, "Negotiation deleted");
        Ok(())
    }

    pub async fn list_installments(
        &self,
        negotiation_id: NegotiationId,
        kind: InstallmentKind,
        page: Option<Page>,
    ) -> Result<Paged<Installment>, ServiceError> {
        Ok(self
            .repo
            .list_installments(negotiation_id, kind, self.page(page))
            .await?)
    }

    pub async fn get_installment(&self, id: InstallmentId) -> Result<Installment, ServiceError> {
        self.require_installment(id).await
    }

    /// Register a payment (or correct one) on an installment.
    ///
    /// Installments are never removed one by one; they go with their
    /// negotiation, so every schedule keeps contiguous sequence numbers.
    ///
    /// # Errors
    /// `NotFound`, or `InvalidArgument` for a negative paid amount or one with
    /// fractions of a cent.
    pub async fn record_payment(
        &self,
        id: InstallmentId,
        patch: InstallmentPatch,
    ) -> Result<Installment, ServiceError> {
        if let Some(amount) = patch.paid_amount {
            if amount.is_negative() {
                return Err(ServiceError::InvalidArgument(
                    "paid amount must not be negative".to_string(),
                ));
            }
            if amount.round_money() != amount {
                return Err(ServiceError::InvalidArgument(format!(
                    "paid amount must have at most two decimal places, got {}",
                    amount
                )));
            }
        }

        let mut installment = self.require_installment(id).await?;
        if patch.is_empty() {
            return Ok(installment);
        }

        patch.apply(&mut installment);
        self.repo.update_installment_payment(&installment).await?;
        info!(
            installment_id = %id,
            negotiation_id = %installment.negotiation_id,
            is_paid = installment.is_paid,
            "Installment payment updated"
        );
        Ok(installment)
    }

    fn page(&self, page: Option<Page>) -> Page {
        page.unwrap_or(Page::new(1, self.config.default_page_size))
            .clamped(self.config.max_page_size)
    }

    async fn require_negotiation(&self, id: NegotiationId) -> Result<Negotiation, ServiceError> {
        self.repo
            .get_negotiation(id)
            .await?
            .ok_or_else(|| negotiation_not_found(id))
    }

    async fn require_installment(&self, id: InstallmentId) -> Result<Installment, ServiceError> {
        self.repo
            .get_installment(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("installment {}", id)))
    }
}

fn negotiation_not_found(id: NegotiationId) -> ServiceError {
    ServiceError::NotFound(format!("negotiation {}", id))
}

fn conflict() -> ServiceError {
    ServiceError::Conflict("a negotiation is already registered for this case".to_string())
}

fn map_unique_violation(err: sqlx::Error) -> ServiceError {
    if is_unique_violation(&err) {
        conflict()
    } else {
        ServiceError::Db(err)
    }
}
