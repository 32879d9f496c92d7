//! In-memory ledger and audit log.
//! Behaves like the MySQL adapters, minus durability. Used by tests and by
//! callers that want a store without a database.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{
    CallLogEntry, CallLogId, LoggingSwitch, PayId, Transaction, TransactionId, TransactionUpdate,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::{CallAuditLog, TransactionLedger};
use crate::validation;

#[derive(Default)]
struct LedgerState {
    next_pay_id: PayId,
    transactions: HashMap<PayId, Transaction>,
    ref_index: HashMap<String, PayId>,
}

/// A thread-safe in-memory transaction ledger.
///
/// A single `RwLock` guards both the records and the `ref_id` index, so the
/// uniqueness check and the write in `update_transaction` cannot interleave
/// with another claim. Index entries are never removed: a `ref_id` replaced
/// on its transaction stays reserved for that transaction.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn save_transaction(
        &self,
        transaction_id: TransactionId,
        bank_name: &str,
        amount: i64,
    ) -> LedgerResult<PayId> {
        validation::validate_bank_name(bank_name)?;

        let mut state = self.state.write().await;
        state.next_pay_id += 1;
        let pay_id = state.next_pay_id;
        state.transactions.insert(
            pay_id,
            Transaction::new(pay_id, transaction_id, bank_name.to_string(), amount),
        );

        tracing::debug!(pay_id, transaction_id, bank_name, "transaction saved");
        Ok(pay_id)
    }

    async fn update_transaction(
        &self,
        pay_id: PayId,
        update: TransactionUpdate,
    ) -> LedgerResult<bool> {
        if let Some(ref_id) = update.claimed_ref_id() {
            validation::validate_reference_id(ref_id)?;
        }
        if let Some(authority_id) = &update.authority_id {
            validation::validate_authority_id(authority_id)?;
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if !state.transactions.contains_key(&pay_id) {
            return Err(LedgerError::transaction_not_found(pay_id));
        }

        if let Some(ref_id) = update.claimed_ref_id() {
            if let Some(&owner) = state.ref_index.get(ref_id) {
                if owner != pay_id {
                    tracing::warn!(pay_id, owner, ref_id, "reference id already claimed");
                    return Ok(false);
                }
            }
        }

        let tx = state
            .transactions
            .get_mut(&pay_id)
            .ok_or_else(|| LedgerError::transaction_not_found(pay_id))?;

        if let Some(ref_id) = update.claimed_ref_id() {
            state.ref_index.insert(ref_id.to_string(), pay_id);
            tx.ref_id = Some(ref_id.to_string());
        }
        if let Some(authority_id) = update.authority_id {
            tx.authority_id = Some(authority_id);
        }
        if let Some(status) = update.status {
            tx.status = status;
        }
        tx.updated_at = Utc::now();

        tracing::debug!(pay_id, status = %tx.status, "transaction updated");
        Ok(true)
    }

    async fn get_transaction(&self, pay_id: PayId) -> LedgerResult<Transaction> {
        let state = self.state.read().await;
        state
            .transactions
            .get(&pay_id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(pay_id))
    }

    async fn is_reference_id_unique(&self, ref_id: &str) -> LedgerResult<bool> {
        let state = self.state.read().await;
        Ok(!state.ref_index.contains_key(ref_id))
    }

    async fn find_by_reference_id(&self, ref_id: &str) -> LedgerResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .ref_index
            .get(ref_id)
            .and_then(|pay_id| state.transactions.get(pay_id))
            .filter(|tx| tx.ref_id.as_deref() == Some(ref_id))
            .cloned())
    }
}

#[derive(Default)]
struct CallLogState {
    next_id: u64,
    entries: HashMap<u64, CallLogEntry>,
}

/// A thread-safe in-memory method-call audit log.
#[derive(Clone)]
pub struct InMemoryCallAuditLog {
    entries: Arc<RwLock<CallLogState>>,
    switch: LoggingSwitch,
}

impl InMemoryCallAuditLog {
    pub fn new(logging_enabled: bool) -> Self {
        Self::with_switch(LoggingSwitch::new(logging_enabled))
    }

    pub fn with_switch(switch: LoggingSwitch) -> Self {
        Self {
            entries: Arc::new(RwLock::new(CallLogState::default())),
            switch,
        }
    }

    pub fn switch(&self) -> LoggingSwitch {
        self.switch.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CallAuditLog for InMemoryCallAuditLog {
    fn logging_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    fn set_logging_enabled(&self, enabled: bool) {
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

        let mut state = self.entries.write().await;
        state.next_id += 1;
        let id = state.next_id;
        state.entries.insert(
            id,
            CallLogEntry {
                id,
                payment_id,
                method_name: method_name.to_string(),
                input,
                output: None,
                status_code: None,
                created_at: Utc::now(),
                responded_at: None,
            },
        );

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

        let mut state = self.entries.write().await;
        match state.entries.get_mut(&id) {
            Some(entry) => {
                entry.output = output;
                entry.status_code = status_code;
                entry.responded_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_call(&self, id: u64) -> LedgerResult<CallLogEntry> {
        let state = self.entries.read().await;
        state
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::call_not_found(id))
    }

    async fn calls_for_payment(&self, payment_id: PayId) -> LedgerResult<Vec<CallLogEntry>> {
        let state = self.entries.read().await;
        let mut calls: Vec<CallLogEntry> = state
            .entries
            .values()
            .filter(|entry| entry.payment_id == payment_id)
            .cloned()
            .collect();
        calls.sort_by_key(|entry| entry.id);
        Ok(calls)
    }
}
