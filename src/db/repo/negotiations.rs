//! Negotiation operations for the repository.

use crate::domain::{
    CaseRef, GenerationFlags, Negotiation, NegotiationId, NewNegotiation, Page, Paged,
};
use sqlx::Row;

use super::{like_pattern, negotiation_from_row, Repository, NEGOTIATION_COLUMNS};

impl Repository {
    /// Insert a negotiation with the given generation flags and return the stored row.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including a UNIQUE violation on
    /// the (case number, debtor, contract) triple.
    pub async fn insert_negotiation(
        &self,
        new: &NewNegotiation,
        flags: GenerationFlags,
    ) -> Result<Negotiation, sqlx::Error> {
        let terms = &new.terms;
        let status = &new.status;

        let result = sqlx::query(
            r#"
            INSERT INTO negotiations (
                case_number, debtor, contract, amount_owed, discount, principal, monthly_rate,
                installment_count, first_installment_date, last_installment_date,
                down_payment_amount, down_payment_installment_count, first_down_payment_date,
                last_down_payment_date, notes, is_extrajudicial_term,
                is_extrajudicial_homologation, is_defaulted, is_settled,
                is_returned_to_enforcement, computed_installment_amount,
                needs_monthly_schedule, needs_down_payment_schedule, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '0', ?, ?, ?)
            "#,
        )
        .bind(terms.case.case_number.as_deref())
        .bind(terms.case.debtor.as_str())
        .bind(terms.case.contract.as_deref())
        .bind(terms.amount_owed.to_canonical_string())
        .bind(terms.discount.to_canonical_string())
        .bind(terms.principal.to_canonical_string())
        .bind(terms.monthly_rate.to_canonical_string())
        .bind(terms.installment_count)
        .bind(terms.first_installment_date)
        .bind(terms.last_installment_date)
        .bind(terms.down_payment.amount.map(|d| d.to_canonical_string()))
        .bind(terms.down_payment.installment_count)
        .bind(terms.down_payment.first_date)
        .bind(terms.down_payment.last_date)
        .bind(terms.notes.as_deref())
        .bind(status.is_extrajudicial_term)
        .bind(status.is_extrajudicial_homologation)
        .bind(status.is_defaulted)
        .bind(status.is_settled)
        .bind(status.is_returned_to_enforcement)
        .bind(flags.needs_monthly_schedule)
        .bind(flags.needs_down_payment_schedule)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id = NegotiationId::new(result.last_insert_rowid());
        self.get_negotiation(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a negotiation by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_negotiation(
        &self,
        id: NegotiationId,
    ) -> Result<Option<Negotiation>, sqlx::Error> {
        let sql = format!("SELECT {} FROM negotiations WHERE id = ?", NEGOTIATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(negotiation_from_row).transpose()
    }

    /// Find the negotiation registered for a case triple. Missing case number
    /// or contract match only rows where that column is also missing.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_negotiation_by_case(
        &self,
        case: &CaseRef,
    ) -> Result<Option<Negotiation>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM negotiations WHERE case_number IS ? AND debtor = ? AND contract IS ?",
            NEGOTIATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(case.case_number.as_deref())
            .bind(case.debtor.as_str())
            .bind(case.contract.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(negotiation_from_row).transpose()
    }

    /// Search negotiations by a case-insensitive substring of the case number,
    /// debtor or contract. Newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_negotiations(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Paged<Negotiation>, sqlx::Error> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        const FILTER: &str = r#"
            WHERE ?1 IS NULL
               OR case_number LIKE ?1 ESCAPE '\'
               OR debtor LIKE ?1 ESCAPE '\'
               OR contract LIKE ?1 ESCAPE '\'
        "#;

        let count_sql = format!("SELECT COUNT(*) AS total FROM negotiations {}", FILTER);
        let total_records: i64 = sqlx::query(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let sql = format!(
            "SELECT {} FROM negotiations {} ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            NEGOTIATION_COLUMNS, FILTER
        );
        let rows = sqlx::query(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let rows = rows
            .iter()
            .map(negotiation_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paged {
            rows,
            total_records,
        })
    }

    /// Ids of negotiations that still have a schedule waiting to be generated.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_pending_generation(&self) -> Result<Vec<NegotiationId>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM negotiations
            WHERE needs_monthly_schedule = 1 OR needs_down_payment_schedule = 1
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("id").map(NegotiationId::new))
            .collect()
    }

    /// Persist the editable columns of a negotiation. Generation flags and the
    /// computed installment amount are left as stored.
    ///
    /// # Errors
    /// Returns an error if the update fails, including a UNIQUE violation on
    /// the case triple.
    pub async fn update_negotiation(&self, negotiation: &Negotiation) -> Result<bool, sqlx::Error> {
        let terms = &negotiation.terms;
        let status = &negotiation.status;

        let result = sqlx::query(
            r#"
            UPDATE negotiations SET
                case_number = ?, debtor = ?, contract = ?, amount_owed = ?, discount = ?,
                principal = ?, monthly_rate = ?, installment_count = ?,
                first_installment_date = ?, last_installment_date = ?,
                down_payment_amount = ?, down_payment_installment_count = ?,
                first_down_payment_date = ?, last_down_payment_date = ?, notes = ?,
                is_extrajudicial_term = ?, is_extrajudicial_homologation = ?,
                is_defaulted = ?, is_settled = ?, is_returned_to_enforcement = ?
            WHERE id = ?
            "#,
        )
        .bind(terms.case.case_number.as_deref())
        .bind(terms.case.debtor.as_str())
        .bind(terms.case.contract.as_deref())
        .bind(terms.amount_owed.to_canonical_string())
        .bind(terms.discount.to_canonical_string())
        .bind(terms.principal.to_canonical_string())
        .bind(terms.monthly_rate.to_canonical_string())
        .bind(terms.installment_count)
        .bind(terms.first_installment_date)
        .bind(terms.last_installment_date)
        .bind(terms.down_payment.amount.map(|d| d.to_canonical_string()))
        .bind(terms.down_payment.installment_count)
        .bind(terms.down_payment.first_date)
        .bind(terms.down_payment.last_date)
        .bind(terms.notes.as_deref())
        .bind(status.is_extrajudicial_term)
        .bind(status.is_extrajudicial_homologation)
        .bind(status.is_defaulted)
        .bind(status.is_settled)
        .bind(status.is_returned_to_enforcement)
        .bind(negotiation.id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a negotiation; its installments go with it.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_negotiation(&self, id: NegotiationId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM negotiations WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
