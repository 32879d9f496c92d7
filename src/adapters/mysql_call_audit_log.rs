//! MySQL implementation of CallAuditLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::domain::{CallLogEntry, CallLogId, LoggingSwitch, PayId};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::CallAuditLog;
use crate::validation;

const SELECT_CALL: &str = r#"
    SELECT id, payment_id, method_name, input, output, status_code,
           created_at, responded_at
    FROM ipg_method_calls
"#;

/// MySQL-backed method-call audit log.
///
/// Entries reference a PayID without a foreign key; callers are responsible
/// for passing ids that exist in the ledger.
#[derive(Clone)]
pub struct MySqlCallAuditLog {
    pool: MySqlPool,
    switch: LoggingSwitch,
}

impl MySqlCallAuditLog {
    pub fn new(pool: MySqlPool, switch: LoggingSwitch) -> Self {
        Self { pool, switch }
    }
}

#[async_trait]
impl CallAuditLog for MySqlCallAuditLog {
    fn logging_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    fn set_logging_enabled(&self, enabled: bool) {
        tracing::info!(enabled, "method call logging toggled");
        self.switch.set(enabled);
    }

    async fn log_method_call(
        &self,
        payment_id: PayId,
        method_name: &str,
        input: Value,
    ) -> LedgerResult<CallLogId> {
        if !self.switch.is_enabled() {
            return Ok(CallLogId::NotLogged);
        }
        validation::validate_method_name(method_name)?;

        let result = sqlx::query(
            "INSERT INTO ipg_method_calls (payment_id, method_name, input) VALUES (?, ?, ?)",
        )
        .bind(payment_id)
        .bind(method_name)
        .bind(input)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        tracing::debug!(id, payment_id, method_name, "method call logged");
        Ok(CallLogId::Logged(id))
    }

    async fn log_method_response(
        &self,
        id: CallLogId,
        output: Option<Value>,
        status_code: Option<i32>,
    ) -> LedgerResult<bool> {
        let Some(id) = id.get() else {
            return Ok(false);
        };
        if !self.switch.is_enabled() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        let exists: Option<(u64,)> =
            sqlx::query_as("SELECT id FROM ipg_method_calls WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            tx.rollback().await?;
            tracing::debug!(id, "response for unknown method call ignored");
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE ipg_method_calls
            SET output = ?, status_code = ?, responded_at = CURRENT_TIMESTAMP(6)
            WHERE id = ?
            "#,
        )
        .bind(output)
        .bind(status_code)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(id, status_code, "method response logged");
        Ok(true)
    }

    async fn get_call(&self, id: u64) -> LedgerResult<CallLogEntry> {
        let row = sqlx::query_as::<_, CallRow>(&format!("{} WHERE id = ?", SELECT_CALL))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CallRow::into_domain)
            .ok_or_else(|| LedgerError::call_not_found(id))
    }

    async fn calls_for_payment(&self, payment_id: PayId) -> LedgerResult<Vec<CallLogEntry>> {
        let rows = sqlx::query_as::<_, CallRow>(&format!(
            "{} WHERE payment_id = ? ORDER BY id ASC",
            SELECT_CALL
        ))
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CallRow::into_domain).collect())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    id: u64,
    payment_id: u64,
    method_name: String,
    input: Value,
    output: Option<Value>,
    status_code: Option<i32>,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl CallRow {
    fn into_domain(self) -> CallLogEntry {
        CallLogEntry {
            id: self.id,
            payment_id: self.payment_id,
            method_name: self.method_name,
            input: self.input,
            output: self.output,
            status_code: self.status_code,
            created_at: self.created_at,
            responded_at: self.responded_at,
        }
    }
}
