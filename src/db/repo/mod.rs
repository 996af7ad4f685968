//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by table:
//! - `negotiations.rs` - Negotiation create/read/search/update/delete
//! - `installments.rs` - Installment reads and payment updates
//! - `generation.rs` - Transactional schedule generation sessions

mod generation;
mod installments;
mod negotiations;

pub use generation::SqliteGenerationSession;

use crate::domain::{
    CaseRef, Decimal, DownPaymentTerms, GenerationFlags, Installment, InstallmentId,
    InstallmentKind, Negotiation, NegotiationId, NegotiationStatus, NegotiationTerms,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const NEGOTIATION_COLUMNS: &str = r#"
    id, case_number, debtor, contract, amount_owed, discount, principal, monthly_rate,
    installment_count, first_installment_date, last_installment_date,
    down_payment_amount, down_payment_installment_count, first_down_payment_date,
    last_down_payment_date, notes, is_extrajudicial_term, is_extrajudicial_homologation,
    is_defaulted, is_settled, is_returned_to_enforcement, computed_installment_amount,
    needs_monthly_schedule, needs_down_payment_schedule
"#;

const INSTALLMENT_COLUMNS: &str = r#"
    id, negotiation_id, kind, sequence_number, due_date, amount, paid_amount,
    paid_date, payment_notes, is_paid, is_interest_adjusted
"#;

fn column_error(column: &str, source: impl Into<sqlx::error::BoxDynError>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: source.into(),
    }
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| column_error(column, e))
}

fn decode_opt_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| Decimal::from_str(&s).map_err(|e| column_error(column, e)))
        .transpose()
}

fn decode_u32(row: &SqliteRow, column: &str) -> Result<u32, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|e| column_error(column, e))
}

fn decode_opt_u32(row: &SqliteRow, column: &str) -> Result<Option<u32>, sqlx::Error> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|v| u32::try_from(v).map_err(|e| column_error(column, e)))
        .transpose()
}

fn decode_flags(row: &SqliteRow) -> Result<GenerationFlags, sqlx::Error> {
    Ok(GenerationFlags {
        needs_monthly_schedule: row.try_get("needs_monthly_schedule")?,
        needs_down_payment_schedule: row.try_get("needs_down_payment_schedule")?,
    })
}

fn negotiation_from_row(row: &SqliteRow) -> Result<Negotiation, sqlx::Error> {
    let terms = NegotiationTerms {
        case: CaseRef {
            case_number: row.try_get("case_number")?,
            debtor: row.try_get("debtor")?,
            contract: row.try_get("contract")?,
        },
        amount_owed: decode_decimal(row, "amount_owed")?,
        discount: decode_decimal(row, "discount")?,
        principal: decode_decimal(row, "principal")?,
        monthly_rate: decode_decimal(row, "monthly_rate")?,
        installment_count: decode_u32(row, "installment_count")?,
        first_installment_date: row.try_get("first_installment_date")?,
        last_installment_date: row.try_get("last_installment_date")?,
        down_payment: DownPaymentTerms {
            amount: decode_opt_decimal(row, "down_payment_amount")?,
            installment_count: decode_opt_u32(row, "down_payment_installment_count")?,
            first_date: row.try_get("first_down_payment_date")?,
            last_date: row.try_get("last_down_payment_date")?,
        },
        notes: row.try_get("notes")?,
    };

    let status = NegotiationStatus {
        is_extrajudicial_term: row.try_get("is_extrajudicial_term")?,
        is_extrajudicial_homologation: row.try_get("is_extrajudicial_homologation")?,
        is_defaulted: row.try_get("is_defaulted")?,
        is_settled: row.try_get("is_settled")?,
        is_returned_to_enforcement: row.try_get("is_returned_to_enforcement")?,
    };

    Ok(Negotiation {
        id: NegotiationId::new(row.try_get("id")?),
        terms,
        status,
        computed_installment_amount: decode_decimal(row, "computed_installment_amount")?,
        flags: decode_flags(row)?,
    })
}

fn installment_from_row(row: &SqliteRow) -> Result<Installment, sqlx::Error> {
    let kind_code: i64 = row.try_get("kind")?;
    let kind = InstallmentKind::from_code(kind_code)
        .ok_or_else(|| column_error("kind", format!("unknown installment kind {}", kind_code)))?;

    Ok(Installment {
        id: InstallmentId::new(row.try_get("id")?),
        negotiation_id: NegotiationId::new(row.try_get("negotiation_id")?),
        kind,
        sequence_number: decode_u32(row, "sequence_number")?,
        due_date: row.try_get("due_date")?,
        amount: decode_decimal(row, "amount")?,
        paid_amount: decode_opt_decimal(row, "paid_amount")?,
        paid_date: row.try_get("paid_date")?,
        payment_notes: row.try_get("payment_notes")?,
        is_paid: row.try_get("is_paid")?,
        is_interest_adjusted: row.try_get("is_interest_adjusted")?,
    })
}

/// Escape LIKE wildcards in user input and wrap it for substring matching.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
