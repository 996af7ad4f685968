//! One-time schedule generation run after a negotiation is stored.

use super::store::{GenerationSession, GenerationUpdate, InstallmentStore, StoreError};
use crate::domain::{
    Decimal, GenerationFlags, GenerationStage, Installment, InstallmentKind, Negotiation,
    NegotiationId,
};
use crate::engine::{
    generate_down_payment_schedule, generate_monthly_schedule, EngineError, Schedule,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PostProcessError {
    /// Calculation inputs were rejected; nothing was written.
    #[error(transparent)]
    InvalidArgument(#[from] EngineError),
    /// The run could not be completed as a unit; flags were left set for a retry.
    #[error("schedule generation failed for negotiation {negotiation_id}: {source}")]
    ScheduleGenerationFailure {
        negotiation_id: NegotiationId,
        #[source]
        source: StoreError,
    },
}

/// Where a skipped installment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Construction,
    Save,
}

/// An installment that was skipped while the rest of its schedule was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentPersistenceFailure {
    pub kind: InstallmentKind,
    pub sequence_number: u32,
    pub stage: FailureStage,
    pub reason: String,
}

/// What happened to one schedule during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    pub kind: InstallmentKind,
    pub expected: u32,
    pub saved: Vec<Installment>,
    pub failures: Vec<InstallmentPersistenceFailure>,
}

impl ScheduleOutcome {
    fn new(kind: InstallmentKind, expected: u32) -> Self {
        Self {
            kind,
            expected,
            saved: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Summary of a `process` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub negotiation_id: NegotiationId,
    pub monthly: Option<ScheduleOutcome>,
    pub down_payment: Option<ScheduleOutcome>,
    /// Generation stage of the negotiation once the call returned.
    pub stage: GenerationStage,
}

impl ProcessReport {
    fn noop(negotiation_id: NegotiationId, stage: GenerationStage) -> Self {
        Self {
            negotiation_id,
            monthly: None,
            down_payment: None,
            stage,
        }
    }

    /// True when the run had nothing to generate.
    pub fn is_noop(&self) -> bool {
        self.monthly.is_none() && self.down_payment.is_none()
    }

    /// True when no installment was skipped.
    pub fn is_complete(&self) -> bool {
        self.outcomes().all(ScheduleOutcome::is_complete)
    }

    pub fn saved_count(&self) -> usize {
        self.outcomes().map(|o| o.saved.len()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstallmentPersistenceFailure> {
        self.outcomes().flat_map(|o| o.failures.iter())
    }

    fn outcomes(&self) -> impl Iterator<Item = &ScheduleOutcome> {
        self.monthly.iter().chain(self.down_payment.iter())
    }
}

/// Generates and persists the installment schedules of a freshly stored
/// negotiation, exactly once.
#[derive(Clone)]
pub struct NegotiationPostProcessor {
    store: Arc<dyn InstallmentStore>,
}

impl NegotiationPostProcessor {
    pub fn new(store: Arc<dyn InstallmentStore>) -> Self {
        Self { store }
    }

    /// Generate whatever schedules the negotiation's flags still ask for.
    ///
    /// Both schedules are computed before anything is written, so invalid
    /// inputs fail without side effects. Installments that cannot be built or
    /// saved are skipped and listed in the report; the flags are still cleared
    /// and the run committed. If the run itself cannot be committed, nothing is
    /// kept and the flags stay set.
    ///
    /// Calling this again once both flags are clear is a no-op. On success the
    /// flags and computed amount of `negotiation` are updated in place.
    ///
    /// # Errors
    /// `InvalidArgument` for rejected inputs, `ScheduleGenerationFailure` when
    /// the store fails outside a single installment.
    pub async fn process(
        &self,
        negotiation: &mut Negotiation,
    ) -> Result<ProcessReport, PostProcessError> {
        let id = negotiation.id;
        if negotiation.flags.is_complete() {
            debug!(negotiation_id = %id, "Schedules already generated, skipping");
            return Ok(ProcessReport::noop(id, negotiation.flags.stage()));
        }

        let monthly = negotiation
            .flags
            .needs_monthly_schedule
            .then(|| generate_monthly_schedule(&negotiation.terms))
            .transpose()?;
        let down_payment = negotiation
            .flags
            .needs_down_payment_schedule
            .then(|| generate_down_payment_schedule(&negotiation.terms))
            .transpose()?;

        let failure = |source: StoreError| PostProcessError::ScheduleGenerationFailure {
            negotiation_id: id,
            source,
        };

        debug!(negotiation_id = %id, stage = ?negotiation.flags.stage(), "Generating schedules");
        let mut session = self.store.begin_generation().await.map_err(failure)?;

        // Flags only ever go from set to clear, so a run generates a schedule
        // only when both the caller's copy and the stored row still ask for it.
        let stored = match session.load_flags(id).await {
            Ok(Some(flags)) => flags,
            Ok(None) => {
                abandon(session, id).await;
                return Err(failure(StoreError::MissingNegotiation(id)));
            }
            Err(e) => {
                abandon(session, id).await;
                return Err(failure(e));
            }
        };
        let monthly = monthly.filter(|_| stored.needs_monthly_schedule);
        let down_payment = down_payment.filter(|_| stored.needs_down_payment_schedule);

        if monthly.is_none() && down_payment.is_none() {
            abandon(session, id).await;
            negotiation.flags = GenerationFlags {
                needs_monthly_schedule: negotiation.flags.needs_monthly_schedule
                    && stored.needs_monthly_schedule,
                needs_down_payment_schedule: negotiation.flags.needs_down_payment_schedule
                    && stored.needs_down_payment_schedule,
            };
            debug!(
                negotiation_id = %id,
                stage = ?stored.stage(),
                "Stored flags already clear, skipping"
            );
            return Ok(ProcessReport::noop(id, negotiation.flags.stage()));
        }

        let mut report = ProcessReport::noop(id, stored.stage());
        let mut flags = stored;
        let mut computed_installment_amount: Option<Decimal> = None;

        if let Some(schedule) = monthly {
            computed_installment_amount = Some(schedule.amount());
            report.monthly = Some(persist_schedule(session.as_mut(), id, schedule).await);
            flags.needs_monthly_schedule = false;
        }
        if let Some(schedule) = down_payment {
            report.down_payment = Some(persist_schedule(session.as_mut(), id, schedule).await);
            flags.needs_down_payment_schedule = false;
        }

        let update = GenerationUpdate {
            computed_installment_amount,
            flags,
        };
        if let Err(e) = session.store_generation_result(id, &update).await {
            abandon(session, id).await;
            return Err(failure(e));
        }
        session.commit().await.map_err(failure)?;

        negotiation.flags = flags;
        report.stage = flags.stage();
        if let Some(amount) = computed_installment_amount {
            negotiation.computed_installment_amount = amount;
        }

        let skipped = report.failures().count();
        if skipped > 0 {
            warn!(
                negotiation_id = %id,
                saved = report.saved_count(),
                skipped,
                stage = ?flags.stage(),
                "Schedules generated with skipped installments"
            );
        } else {
            info!(
                negotiation_id = %id,
                saved = report.saved_count(),
                installment_amount = %negotiation.computed_installment_amount,
                stage = ?flags.stage(),
                "Schedules generated"
            );
        }

        Ok(report)
    }
}

async fn persist_schedule(
    session: &mut dyn GenerationSession,
    negotiation_id: NegotiationId,
    schedule: Schedule,
) -> ScheduleOutcome {
    let kind = schedule.kind();
    let mut outcome = ScheduleOutcome::new(kind, schedule.total());

    for (index, entry) in schedule.enumerate() {
        let sequence_number = index as u32 + 1;
        let scheduled = match entry {
            Ok(scheduled) => scheduled,
            Err(e) => {
                warn!(
                    negotiation_id = %negotiation_id,
                    kind = %kind,
                    sequence_number,
                    error = %e,
                    "Failed to build installment, skipping"
                );
                outcome.failures.push(InstallmentPersistenceFailure {
                    kind,
                    sequence_number,
                    stage: FailureStage::Construction,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match session
            .save_installment(&scheduled.for_negotiation(negotiation_id))
            .await
        {
            Ok(row) => outcome.saved.push(row),
            Err(e) => {
                warn!(
                    negotiation_id = %negotiation_id,
                    kind = %kind,
                    sequence_number,
                    error = %e,
                    "Failed to save installment, skipping"
                );
                outcome.failures.push(InstallmentPersistenceFailure {
                    kind,
                    sequence_number,
                    stage: FailureStage::Save,
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome
}

async fn abandon(session: Box<dyn GenerationSession>, negotiation_id: NegotiationId) {
    if let Err(e) = session.rollback().await {
        warn!(negotiation_id = %negotiation_id, error = %e, "Rollback failed");
    }
}
