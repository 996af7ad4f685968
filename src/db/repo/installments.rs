//! Installment operations for the repository.
//!
//! Installments are only ever inserted by a generation session; see `generation.rs`.

use crate::domain::{Installment, InstallmentId, InstallmentKind, NegotiationId, Page, Paged};
use sqlx::Row;

use super::{installment_from_row, Repository, INSTALLMENT_COLUMNS};

impl Repository {
    /// Page through one schedule of a negotiation in sequence order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_installments(
        &self,
        negotiation_id: NegotiationId,
        kind: InstallmentKind,
        page: Page,
    ) -> Result<Paged<Installment>, sqlx::Error> {
        let total_records: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM installments WHERE negotiation_id = ? AND kind = ?",
        )
        .bind(negotiation_id.as_i64())
        .bind(kind.code())
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let sql = format!(
            r#"
            SELECT {} FROM installments
            WHERE negotiation_id = ? AND kind = ?
            ORDER BY sequence_number ASC
            LIMIT ? OFFSET ?
            "#,
            INSTALLMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(negotiation_id.as_i64())
            .bind(kind.code())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let rows = rows
            .iter()
            .map(installment_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paged {
            rows,
            total_records,
        })
    }

    /// All installments of a negotiation, contract schedule first, each in sequence order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_installments(
        &self,
        negotiation_id: NegotiationId,
    ) -> Result<Vec<Installment>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM installments
            WHERE negotiation_id = ?
            ORDER BY kind ASC, sequence_number ASC
            "#,
            INSTALLMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(negotiation_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(installment_from_row).collect()
    }

    /// Get an installment by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_installment(
        &self,
        id: InstallmentId,
    ) -> Result<Option<Installment>, sqlx::Error> {
        let sql = format!("SELECT {} FROM installments WHERE id = ?", INSTALLMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(installment_from_row).transpose()
    }

    /// Persist the payment columns of an installment.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_installment_payment(
        &self,
        installment: &Installment,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE installments SET
                paid_amount = ?, paid_date = ?, payment_notes = ?,
                is_paid = ?, is_interest_adjusted = ?
            WHERE id = ?
            "#,
        )
        .bind(installment.paid_amount.map(|d| d.to_money_string()))
        .bind(installment.paid_date)
        .bind(installment.payment_notes.as_deref())
        .bind(installment.is_paid)
        .bind(installment.is_interest_adjusted)
        .bind(installment.id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
