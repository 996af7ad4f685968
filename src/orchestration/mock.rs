//! In-memory installment store for testing without a database.

use super::store::{GenerationSession, GenerationUpdate, InstallmentStore, StoreError};
use crate::domain::{
    Decimal, GenerationFlags, Installment, InstallmentId, InstallmentKind, NegotiationId,
    NewInstallment,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    flags: HashMap<NegotiationId, GenerationFlags>,
    computed_amounts: HashMap<NegotiationId, Decimal>,
    installments: Vec<Installment>,
    next_id: i64,
    sessions_begun: usize,
    fail_begin: bool,
    fail_commit: bool,
    fail_rows: HashSet<(InstallmentKind, u32)>,
}

/// Mock store that keeps committed state in memory and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MockInstallmentStore {
    state: Arc<Mutex<MockState>>,
}

impl MockInstallmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stored negotiation with its current flags.
    pub fn with_negotiation(self, id: NegotiationId, flags: GenerationFlags) -> Self {
        self.lock().flags.insert(id, flags);
        self
    }

    /// Make `begin_generation` fail, as if the database were unreachable.
    pub fn failing_begin(self) -> Self {
        self.lock().fail_begin = true;
        self
    }

    /// Make `commit` fail.
    pub fn failing_commit(self) -> Self {
        self.lock().fail_commit = true;
        self
    }

    /// Reject the save of one specific installment.
    pub fn failing_row(self, kind: InstallmentKind, sequence_number: u32) -> Self {
        self.lock().fail_rows.insert((kind, sequence_number));
        self
    }

    pub fn flags(&self, id: NegotiationId) -> Option<GenerationFlags> {
        self.lock().flags.get(&id).copied()
    }

    pub fn computed_amount(&self, id: NegotiationId) -> Option<Decimal> {
        self.lock().computed_amounts.get(&id).copied()
    }

    /// Committed installments, in insertion order.
    pub fn installments(&self) -> Vec<Installment> {
        self.lock().installments.clone()
    }

    pub fn sessions_begun(&self) -> usize {
        self.lock().sessions_begun
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InstallmentStore for MockInstallmentStore {
    async fn begin_generation(&self) -> Result<Box<dyn GenerationSession>, StoreError> {
        let mut state = self.lock();
        state.sessions_begun += 1;
        if state.fail_begin {
            return Err(StoreError::Unavailable("mock store is down".to_string()));
        }
        Ok(Box::new(MockSession {
            store: self.clone(),
            pending_installments: Vec::new(),
            pending_update: None,
        }))
    }
}

struct MockSession {
    store: MockInstallmentStore,
    pending_installments: Vec<Installment>,
    pending_update: Option<(NegotiationId, GenerationUpdate)>,
}

#[async_trait]
impl GenerationSession for MockSession {
    async fn load_flags(&mut self, id: NegotiationId) -> Result<Option<GenerationFlags>, StoreError> {
        Ok(self.store.flags(id))
    }

    async fn save_installment(&mut self, installment: &NewInstallment) -> Result<Installment, StoreError> {
        let mut state = self.store.lock();
        if state
            .fail_rows
            .contains(&(installment.kind, installment.sequence_number))
        {
            return Err(StoreError::Rejected(format!(
                "{} installment {}",
                installment.kind, installment.sequence_number
            )));
        }

        let key = (
            installment.negotiation_id,
            installment.kind,
            installment.sequence_number,
        );
        let duplicate = state
            .installments
            .iter()
            .chain(self.pending_installments.iter())
            .any(|i| (i.negotiation_id, i.kind, i.sequence_number) == key);
        if duplicate {
            return Err(StoreError::Rejected("duplicate sequence number".to_string()));
        }

        state.next_id += 1;
        let row = Installment::unpaid(InstallmentId::new(state.next_id), installment);
        self.pending_installments.push(row.clone());
        Ok(row)
    }

    async fn store_generation_result(
        &mut self,
        id: NegotiationId,
        update: &GenerationUpdate,
    ) -> Result<(), StoreError> {
        if self.store.flags(id).is_none() {
            return Err(StoreError::MissingNegotiation(id));
        }
        self.pending_update = Some((id, *update));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MockSession {
            store,
            pending_installments,
            pending_update,
        } = *self;
        let mut state = store.lock();
        if state.fail_commit {
            return Err(StoreError::Unavailable("commit failed".to_string()));
        }
        state.installments.extend(pending_installments);
        if let Some((id, update)) = pending_update {
            state.flags.insert(id, update.flags);
            if let Some(amount) = update.computed_installment_amount {
                state.computed_amounts.insert(id, amount);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
