//! Capability traits consumed by gateway integrations.
//! Callers hold `Arc<dyn TransactionLedger>` / `Arc<dyn CallAuditLog>` and never
//! see which store backs them.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    CallLogEntry, CallLogId, PayId, Transaction, TransactionId, TransactionStatus,
    TransactionUpdate,
};
use crate::error::LedgerResult;

/// Authoritative store of payment attempts.
///
/// Status values are stored as given; no transition is rejected here.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Records a new attempt with status `NotCompleted` and returns its PayID.
    async fn save_transaction(
        &self,
        transaction_id: TransactionId,
        bank_name: &str,
        amount: i64,
    ) -> LedgerResult<PayId>;

    /// Applies the fields present in `update`.
    ///
    /// Returns `Ok(false)` without writing anything when the requested
    /// `ref_id` is already held by another transaction. The uniqueness check
    /// and the write happen as one atomic step.
    async fn update_transaction(&self, pay_id: PayId, update: TransactionUpdate)
        -> LedgerResult<bool>;

    async fn get_transaction(&self, pay_id: PayId) -> LedgerResult<Transaction>;

    async fn is_reference_id_unique(&self, ref_id: &str) -> LedgerResult<bool>;

    async fn find_by_reference_id(&self, ref_id: &str) -> LedgerResult<Option<Transaction>>;

    async fn get_payment_gateway(&self, pay_id: PayId) -> LedgerResult<String> {
        Ok(self.get_transaction(pay_id).await?.bank_name)
    }

    async fn get_transaction_status(&self, pay_id: PayId) -> LedgerResult<TransactionStatus> {
        Ok(self.get_transaction(pay_id).await?.status)
    }

    async fn get_transaction_id(&self, pay_id: PayId) -> LedgerResult<TransactionId> {
        Ok(self.get_transaction(pay_id).await?.transaction_id)
    }

    async fn get_transaction_amount(&self, pay_id: PayId) -> LedgerResult<i64> {
        Ok(self.get_transaction(pay_id).await?.amount)
    }
}

/// Append-only trail of method calls made against a PayID.
#[async_trait]
pub trait CallAuditLog: Send + Sync {
    fn logging_enabled(&self) -> bool;

    /// Affects every call made after it returns.
    fn set_logging_enabled(&self, enabled: bool);

    /// Persists a new entry, or returns [`CallLogId::NotLogged`] without
    /// writing while logging is disabled.
    async fn log_method_call(
        &self,
        payment_id: PayId,
        method_name: &str,
        input: Value,
    ) -> LedgerResult<CallLogId>;

    /// Fills `output` and `status_code` of an existing entry.
    ///
    /// Returns `Ok(false)` when the id was never logged, does not exist, or
    /// logging is currently disabled.
    async fn log_method_response(
        &self,
        id: CallLogId,
        output: Option<Value>,
        status_code: Option<i32>,
    ) -> LedgerResult<bool>;

    async fn get_call(&self, id: u64) -> LedgerResult<CallLogEntry>;

    async fn calls_for_payment(&self, payment_id: PayId) -> LedgerResult<Vec<CallLogEntry>>;
}
