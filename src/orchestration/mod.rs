//! Orchestration of schedule generation around persistence.
//!
//! This module provides:
//! - The `InstallmentStore` / `GenerationSession` persistence seam
//! - `NegotiationPostProcessor`, the one-time generation run
//! - `NegotiationService`, the create/update/delete entry points
//! - An in-memory store for tests

pub mod mock;
pub mod post_processor;
pub mod service;
pub mod store;

pub use mock::MockInstallmentStore;
pub use post_processor::{
    FailureStage, InstallmentPersistenceFailure, NegotiationPostProcessor, PostProcessError,
    ProcessReport, ScheduleOutcome,
};
pub use service::{CreatedNegotiation, GenerationSweep, NegotiationService};
pub use store::{GenerationSession, GenerationUpdate, InstallmentStore, StoreError};
