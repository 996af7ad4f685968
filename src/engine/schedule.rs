//! Lazily generated installment schedule.

use super::calendar::{add_one_month, first_due_date};
use super::EngineError;
use crate::domain::{Decimal, InstallmentKind, ScheduledInstallment};
use chrono::NaiveDate;

/// Finite, non-restartable sequence of equal-amount installments due one
/// calendar month apart.
///
/// Each entry is yielded as its own `Result` so that one entry failing to
/// construct (due date out of range, non-positive amount) does not hide the
/// remaining ones. Entries come out in sequence and due-date order.
#[derive(Debug, Clone)]
pub struct Schedule {
    kind: InstallmentKind,
    amount: Decimal,
    count: u32,
    next_sequence: u32,
    // None once the calendar ran out of range.
    next_due: Option<NaiveDate>,
}

impl Schedule {
    /// Schedule of `count` entries of `amount`, the first due the day after `seed`.
    pub fn new(kind: InstallmentKind, amount: Decimal, count: u32, seed: NaiveDate) -> Self {
        Self {
            kind,
            amount,
            count,
            next_sequence: 1,
            next_due: first_due_date(seed),
        }
    }

    pub fn empty(kind: InstallmentKind) -> Self {
        Self {
            kind,
            amount: Decimal::zero(),
            count: 0,
            next_sequence: 1,
            next_due: None,
        }
    }

    pub fn kind(&self) -> InstallmentKind {
        self.kind
    }

    /// Amount of every entry.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Total number of entries, including those already yielded.
    pub fn total(&self) -> u32 {
        self.count
    }
}

impl Iterator for Schedule {
    type Item = Result<ScheduledInstallment, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_sequence > self.count {
            return None;
        }
        let sequence_number = self.next_sequence;
        self.next_sequence += 1;

        let Some(due_date) = self.next_due else {
            return Some(Err(EngineError::DateOverflow {
                kind: self.kind,
                sequence_number,
            }));
        };
        self.next_due = add_one_month(due_date);

        Some(
            ScheduledInstallment::new(self.kind, sequence_number, due_date, self.amount)
                .map_err(EngineError::from),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .count
            .saturating_add(1)
            .saturating_sub(self.next_sequence) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Schedule {}
