//! MySQL implementation of TransactionLedger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::domain::{PayId, Transaction, TransactionId, TransactionStatus, TransactionUpdate};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::TransactionLedger;
use crate::validation;

const SELECT_TRANSACTION: &str = r#"
    SELECT pay_id, transaction_id, bank_name, amount, ref_id, authority_id,
           status, created_at, updated_at
    FROM ipg_transactions
"#;

/// MySQL-backed transaction ledger.
///
/// Every `ref_id` a transaction has held is reserved in `ipg_reference_ids`,
/// whose primary key settles concurrent claims. A replaced `ref_id` stays
/// reserved for its transaction.
#[derive(Clone)]
pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLedger for MySqlLedger {
    async fn save_transaction(
        &self,
        transaction_id: TransactionId,
        bank_name: &str,
        amount: i64,
    ) -> LedgerResult<PayId> {
        validation::validate_bank_name(bank_name)?;

        let result = sqlx::query(
            r#"
            INSERT INTO ipg_transactions (transaction_id, bank_name, amount, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(transaction_id)
        .bind(bank_name)
        .bind(amount)
        .bind(TransactionStatus::NotCompleted.code())
        .execute(&self.pool)
        .await?;

        let pay_id = result.last_insert_id();
        tracing::debug!(pay_id, transaction_id, bank_name, "transaction saved");
        Ok(pay_id)
    }

    async fn update_transaction(
        &self,
        pay_id: PayId,
        update: TransactionUpdate,
    ) -> LedgerResult<bool> {
        let ref_id = update.claimed_ref_id();
        if let Some(ref_id) = ref_id {
            validation::validate_reference_id(ref_id)?;
        }
        if let Some(authority_id) = &update.authority_id {
            validation::validate_authority_id(authority_id)?;
        }

        let mut tx = self.pool.begin().await?;

        let exists: Option<(u64,)> =
            sqlx::query_as("SELECT pay_id FROM ipg_transactions WHERE pay_id = ? FOR UPDATE")
                .bind(pay_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Err(LedgerError::transaction_not_found(pay_id));
        }

        if let Some(ref_id) = ref_id {
            let owner: Option<(u64,)> =
                sqlx::query_as("SELECT pay_id FROM ipg_reference_ids WHERE ref_id = ?")
                    .bind(ref_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match owner {
                Some((owner,)) if owner != pay_id => {
                    tracing::warn!(pay_id, owner, ref_id, "reference id already claimed");
                    tx.rollback().await?;
                    return Ok(false);
                }
                Some(_) => {}
                None => {
                    let reserved =
                        sqlx::query("INSERT INTO ipg_reference_ids (ref_id, pay_id) VALUES (?, ?)")
                            .bind(ref_id)
                            .bind(pay_id)
                            .execute(&mut *tx)
                            .await;
                    if let Err(e) = reserved {
                        if is_unique_violation(&e) {
                            tracing::warn!(pay_id, ref_id, "reference id claimed concurrently");
                            tx.rollback().await?;
                            return Ok(false);
                        }
                        return Err(e.into());
                    }
                }
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE ipg_transactions
            SET ref_id = COALESCE(?, ref_id),
                authority_id = COALESCE(?, authority_id),
                status = COALESCE(?, status),
                updated_at = CURRENT_TIMESTAMP(6)
            WHERE pay_id = ?
            "#,
        )
        .bind(ref_id)
        .bind(update.authority_id.as_deref())
        .bind(update.status.map(TransactionStatus::code))
        .bind(pay_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                tracing::warn!(pay_id, ref_id, "reference id held by another row");
                tx.rollback().await?;
                return Ok(false);
            }
            return Err(e.into());
        }

        tx.commit().await?;
        tracing::debug!(pay_id, status = ?update.status, "transaction updated");
        Ok(true)
    }

    async fn get_transaction(&self, pay_id: PayId) -> LedgerResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "{} WHERE pay_id = ?",
            SELECT_TRANSACTION
        ))
        .bind(pay_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| LedgerError::transaction_not_found(pay_id))?
            .into_domain()
    }

    async fn is_reference_id_unique(&self, ref_id: &str) -> LedgerResult<bool> {
        let (taken,): (i64,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM ipg_reference_ids WHERE ref_id = ?)")
                .bind(ref_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken == 0)
    }

    async fn find_by_reference_id(&self, ref_id: &str) -> LedgerResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "{} WHERE ref_id = ?",
            SELECT_TRANSACTION
        ))
        .bind(ref_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn get_payment_gateway(&self, pay_id: PayId) -> LedgerResult<String> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT bank_name FROM ipg_transactions WHERE pay_id = ?")
                .bind(pay_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(bank_name,)| bank_name)
            .ok_or_else(|| LedgerError::transaction_not_found(pay_id))
    }

    async fn get_transaction_status(&self, pay_id: PayId) -> LedgerResult<TransactionStatus> {
        let row: Option<(i16,)> =
            sqlx::query_as("SELECT status FROM ipg_transactions WHERE pay_id = ?")
                .bind(pay_id)
                .fetch_optional(&self.pool)
                .await?;
        let (code,) = row.ok_or_else(|| LedgerError::transaction_not_found(pay_id))?;
        decode_status(pay_id, code)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

fn decode_status(pay_id: PayId, code: i16) -> LedgerResult<TransactionStatus> {
    TransactionStatus::from_code(code).ok_or_else(|| {
        LedgerError::CorruptRecord(format!(
            "transaction {} has unknown status code {}",
            pay_id, code
        ))
    })
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    pay_id: u64,
    transaction_id: i64,
    bank_name: String,
    amount: i64,
    ref_id: Option<String>,
    authority_id: Option<String>,
    status: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> LedgerResult<Transaction> {
        Ok(Transaction {
            status: decode_status(self.pay_id, self.status)?,
            pay_id: self.pay_id,
            transaction_id: self.transaction_id,
            bank_name: self.bank_name,
            amount: self.amount,
            ref_id: self.ref_id,
            authority_id: self.authority_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
