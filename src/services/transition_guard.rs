use async_trait::async_trait;

use crate::domain::{PayId, Transaction, TransactionId, TransactionStatus, TransactionUpdate};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::TransactionLedger;

/// Opt-in wrapper that refuses status updates outside the advisory lifecycle.
///
/// The wrapped ledger keeps storing whatever it is given; only callers that
/// construct a `TransitionGuard` get the extra check. The current status is
/// read before the write, so two racing updates can still both pass the
/// check.
pub struct TransitionGuard<L> {
    inner: L,
}

impl<L: TransactionLedger> TransitionGuard<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

#[async_trait]
impl<L: TransactionLedger> TransactionLedger for TransitionGuard<L> {
    async fn save_transaction(
        &self,
        transaction_id: TransactionId,
        bank_name: &str,
        amount: i64,
    ) -> LedgerResult<PayId> {
        self.inner
            .save_transaction(transaction_id, bank_name, amount)
            .await
    }

    async fn update_transaction(
        &self,
        pay_id: PayId,
        update: TransactionUpdate,
    ) -> LedgerResult<bool> {
        if let Some(next) = update.status {
            let current = self.inner.get_transaction_status(pay_id).await?;
            if !current.can_transition_to(next) {
                tracing::warn!(pay_id, from = %current, to = %next, "status transition refused");
                return Err(LedgerError::IllegalTransition {
                    from: current,
                    to: next,
                });
            }
        }

        self.inner.update_transaction(pay_id, update).await
    }

    async fn get_transaction(&self, pay_id: PayId) -> LedgerResult<Transaction> {
        self.inner.get_transaction(pay_id).await
    }

    async fn is_reference_id_unique(&self, ref_id: &str) -> LedgerResult<bool> {
        self.inner.is_reference_id_unique(ref_id).await
    }

    async fn find_by_reference_id(&self, ref_id: &str) -> LedgerResult<Option<Transaction>> {
        self.inner.find_by_reference_id(ref_id).await
    }

    async fn get_payment_gateway(&self, pay_id: PayId) -> LedgerResult<String> {
        self.inner.get_payment_gateway(pay_id).await
    }

    async fn get_transaction_status(&self, pay_id: PayId) -> LedgerResult<TransactionStatus> {
        self.inner.get_transaction_status(pay_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use TransactionStatus::*;

    async fn guarded_with(status: TransactionStatus) -> (TransitionGuard<InMemoryLedger>, PayId) {
        let ledger = InMemoryLedger::new();
        let pay_id = ledger.save_transaction(1, "BankX", 1_000).await.unwrap();
        ledger
            .update_transaction(pay_id, TransactionUpdate::new().status(status))
            .await
            .unwrap();
        (TransitionGuard::new(ledger), pay_id)
    }

    #[tokio::test]
    async fn test_allows_forward_transition() {
        let (guard, pay_id) = guarded_with(InProgress).await;
        assert!(guard
            .update_transaction(pay_id, TransactionUpdate::new().status(Verified))
            .await
            .unwrap());
        assert_eq!(guard.get_transaction_status(pay_id).await.unwrap(), Verified);
    }

    #[tokio::test]
    async fn test_refuses_backward_transition() {
        let (guard, pay_id) = guarded_with(Settled).await;
        let err = guard
            .update_transaction(pay_id, TransactionUpdate::new().status(InProgress))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::IllegalTransition {
                from: Settled,
                to: InProgress
            }
        ));
        assert_eq!(guard.get_transaction_status(pay_id).await.unwrap(), Settled);
    }

    #[tokio::test]
    async fn test_repeating_status_is_allowed() {
        let (guard, pay_id) = guarded_with(Verified).await;
        assert!(guard
            .update_transaction(pay_id, TransactionUpdate::new().status(Verified))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_updates_without_status_pass_through() {
        let (guard, pay_id) = guarded_with(Reversed).await;
        assert!(guard
            .update_transaction(pay_id, TransactionUpdate::new().authority_id("AUTH-1"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unknown_pay_id_is_not_found() {
        let guard = TransitionGuard::new(InMemoryLedger::new());
        let err = guard
            .update_transaction(77, TransactionUpdate::new().status(Verified))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
