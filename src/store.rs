//! Construction point for a ledger and audit log pair.

use sqlx::MySqlPool;
use std::sync::Arc;

use crate::adapters::{InMemoryCallAuditLog, InMemoryLedger, MySqlCallAuditLog, MySqlLedger};
use crate::config::Config;
use crate::db;
use crate::domain::LoggingSwitch;
use crate::error::{LedgerError, LedgerResult};
use crate::ports::{CallAuditLog, TransactionLedger};

/// A transaction ledger and the audit log that shares its PayIDs.
///
/// Clones share the same backing store and logging switch.
#[derive(Clone)]
pub struct PaymentStore {
    ledger: Arc<dyn TransactionLedger>,
    audit_log: Arc<dyn CallAuditLog>,
    logging: LoggingSwitch,
    pool: Option<MySqlPool>,
}

impl PaymentStore {
    /// Connects to MySQL. Fails with [`LedgerError::Connection`] when the
    /// server cannot be reached or rejects the credentials.
    pub async fn connect(config: &Config) -> LedgerResult<Self> {
        let pool = db::create_pool(&config.database).await.map_err(|e| {
            tracing::error!("Failed to connect to {}: {}", config.database.masked_url(), e);
            LedgerError::Connection(e)
        })?;

        Ok(Self::from_pool(pool, config.method_logging))
    }

    /// Wraps an already connected pool.
    pub fn from_pool(pool: MySqlPool, logging_enabled: bool) -> Self {
        let logging = LoggingSwitch::new(logging_enabled);
        Self {
            ledger: Arc::new(MySqlLedger::new(pool.clone())),
            audit_log: Arc::new(MySqlCallAuditLog::new(pool.clone(), logging.clone())),
            logging,
            pool: Some(pool),
        }
    }

    pub fn in_memory(logging_enabled: bool) -> Self {
        let logging = LoggingSwitch::new(logging_enabled);
        Self {
            ledger: Arc::new(InMemoryLedger::new()),
            audit_log: Arc::new(InMemoryCallAuditLog::with_switch(logging.clone())),
            logging,
            pool: None,
        }
    }

    /// Applies pending schema migrations. No-op for the in-memory store.
    pub async fn migrate(&self) -> LedgerResult<()> {
        if let Some(pool) = &self.pool {
            db::run_migrations(pool).await?;
        }
        Ok(())
    }

    /// `true` when the backing store answers. Always `true` in memory.
    pub async fn is_healthy(&self) -> bool {
        match &self.pool {
            Some(pool) => db::health_check(pool).await,
            None => true,
        }
    }

    pub fn ledger(&self) -> Arc<dyn TransactionLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn audit_log(&self) -> Arc<dyn CallAuditLog> {
        Arc::clone(&self.audit_log)
    }

    /// Handle for admin paths that flip logging without holding the audit log.
    pub fn logging_switch(&self) -> LoggingSwitch {
        self.logging.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_store_shares_pay_ids() {
        let store = PaymentStore::in_memory(true);
        let pay_id = store
            .ledger()
            .save_transaction(1001, "BankX", 50_000)
            .await
            .unwrap();

        let id = store
            .audit_log()
            .log_method_call(pay_id, "requestPayment", json!({"amount": 50_000}))
            .await
            .unwrap();

        let entry = store.audit_log().get_call(id.get().unwrap()).await.unwrap();
        assert_eq!(entry.payment_id, pay_id);
    }

    #[tokio::test]
    async fn test_switch_handle_controls_audit_log() {
        let store = PaymentStore::in_memory(true);
        let switch = store.logging_switch();

        switch.set(false);
        assert!(!store.audit_log().logging_enabled());

        store.audit_log().set_logging_enabled(true);
        assert!(switch.is_enabled());
    }

    #[tokio::test]
    async fn test_in_memory_store_is_healthy_and_migrates() {
        let store = PaymentStore::in_memory(false);
        assert!(store.is_healthy().await);
        store.migrate().await.unwrap();
    }
}
