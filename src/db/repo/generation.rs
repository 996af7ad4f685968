//! Transactional generation sessions backing the post-processor.

use crate::domain::{GenerationFlags, Installment, InstallmentId, NegotiationId, NewInstallment};
use crate::orchestration::store::{
    GenerationSession, GenerationUpdate, InstallmentStore, StoreError,
};
use async_trait::async_trait;
use sqlx::{Row, Sqlite, Transaction};

use super::{decode_flags, Repository};

/// A generation run inside one SQLite transaction.
///
/// A failed INSERT only aborts its own statement, so the transaction stays
/// usable for the remaining installments. Dropping the session without
/// committing rolls everything back.
pub struct SqliteGenerationSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl InstallmentStore for Repository {
    async fn begin_generation(&self) -> Result<Box<dyn GenerationSession>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteGenerationSession { tx }))
    }
}

#[async_trait]
impl GenerationSession for SqliteGenerationSession {
    async fn load_flags(&mut self, id: NegotiationId) -> Result<Option<GenerationFlags>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT needs_monthly_schedule, needs_down_payment_schedule
            FROM negotiations WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(decode_flags).transpose()?)
    }

    async fn save_installment(&mut self, installment: &NewInstallment) -> Result<Installment, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO installments (
                negotiation_id, kind, sequence_number, due_date, amount,
                paid_amount, paid_date, payment_notes, is_paid, is_interest_adjusted
            ) VALUES (?, ?, ?, ?, ?, NULL, NULL, NULL, 0, 0)
            RETURNING id
            "#,
        )
        .bind(installment.negotiation_id.as_i64())
        .bind(installment.kind.code())
        .bind(installment.sequence_number)
        .bind(installment.due_date)
        .bind(installment.amount.to_money_string())
        .fetch_one(&mut *self.tx)
        .await?;

        let id = InstallmentId::new(row.try_get("id")?);
        Ok(Installment::unpaid(id, installment))
    }

    async fn store_generation_result(
        &mut self,
        id: NegotiationId,
        update: &GenerationUpdate,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE negotiations SET
                needs_monthly_schedule = ?,
                needs_down_payment_schedule = ?,
                computed_installment_amount = COALESCE(?, computed_installment_amount)
            WHERE id = ?
            "#,
        )
        .bind(update.flags.needs_monthly_schedule)
        .bind(update.flags.needs_down_payment_schedule)
        .bind(update.computed_installment_amount.map(|d| d.to_money_string()))
        .bind(id.as_i64())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingNegotiation(id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
