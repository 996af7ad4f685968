pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Decimal, Installment, InstallmentKind, Negotiation, NegotiationId, NegotiationTerms,
    NewNegotiation,
};
pub use engine::{
    compute_installment_amount, generate_down_payment_schedule, generate_monthly_schedule,
    EngineError, Schedule,
};
pub use error::ServiceError;
pub use orchestration::{NegotiationPostProcessor, NegotiationService, ProcessReport};
