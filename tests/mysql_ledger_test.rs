use futures::future::join_all;
use ipg_ledger::config::{Config, DatabaseConfig};
use ipg_ledger::{
    CallLogId, LedgerError, PaymentStore, TransactionLedger, TransactionStatus, TransactionUpdate,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

async fn setup_store() -> Option<PaymentStore> {
    if std::env::var("IPG_DB_NAME").is_err() {
        println!("Skipping MySQL ledger test: IPG_DB_NAME not set");
        return None;
    }

    let config = Config::from_env().expect("Invalid IPG_DB_* configuration");
    let store = PaymentStore::connect(&config)
        .await
        .expect("Failed to connect to MySQL");
    store.migrate().await.expect("Failed to run migrations");
    Some(store)
}

/// Reference ids must be unique across test runs against the same database.
fn unique_ref(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

#[tokio::test]
async fn test_connect_to_unreachable_server_fails_fast() {
    let config = Config::new(
        DatabaseConfig::new("nobody", "nothing", "nowhere")
            .with_host("127.0.0.1")
            .with_port(1),
    );

    let started = Instant::now();
    let result = PaymentStore::connect(&config).await;
    assert!(matches!(result, Err(LedgerError::Connection(_))));
    // a refused connection is not retried until the acquire timeout
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_mysql_payment_flow() {
    let Some(store) = setup_store().await else {
        return;
    };
    let ledger = store.ledger();
    let ref_id = unique_ref("GW");

    let pay_id = ledger.save_transaction(1001, "BankX", 50000).await.unwrap();
    assert_eq!(ledger.get_transaction_amount(pay_id).await.unwrap(), 50000);
    assert_eq!(ledger.get_payment_gateway(pay_id).await.unwrap(), "BankX");
    assert_eq!(ledger.get_transaction_id(pay_id).await.unwrap(), 1001);

    assert!(ledger
        .update_transaction(pay_id, TransactionUpdate::new().status(TransactionStatus::InProgress))
        .await
        .unwrap());
    assert!(ledger
        .update_transaction(
            pay_id,
            TransactionUpdate::new()
                .ref_id(ref_id.clone())
                .status(TransactionStatus::Verified)
        )
        .await
        .unwrap());
    // same values again must still report success
    assert!(ledger
        .update_transaction(pay_id, TransactionUpdate::new().status(TransactionStatus::Verified))
        .await
        .unwrap());

    assert_eq!(
        ledger.get_transaction_status(pay_id).await.unwrap(),
        TransactionStatus::Verified
    );
    assert!(!ledger.is_reference_id_unique(&ref_id).await.unwrap());
}

#[tokio::test]
async fn test_mysql_unknown_pay_id() {
    let Some(store) = setup_store().await else {
        return;
    };
    let ledger = store.ledger();

    assert!(ledger.get_transaction(u64::MAX).await.unwrap_err().is_not_found());
    assert!(ledger
        .update_transaction(u64::MAX, TransactionUpdate::new().status(TransactionStatus::Settled))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_mysql_replaced_ref_id_is_not_reused() {
    let Some(store) = setup_store().await else {
        return;
    };
    let ledger = store.ledger();
    let first_ref = unique_ref("OLD");
    let second_ref = unique_ref("NEW");

    let a = ledger.save_transaction(1, "BankX", 100).await.unwrap();
    let b = ledger.save_transaction(2, "BankX", 100).await.unwrap();

    assert!(ledger
        .update_transaction(a, TransactionUpdate::new().ref_id(first_ref.clone()))
        .await
        .unwrap());
    assert!(ledger
        .update_transaction(a, TransactionUpdate::new().ref_id(second_ref.clone()))
        .await
        .unwrap());

    assert!(!ledger.is_reference_id_unique(&first_ref).await.unwrap());
    assert!(!ledger
        .update_transaction(
            b,
            TransactionUpdate::new()
                .ref_id(first_ref.clone())
                .status(TransactionStatus::Verified)
        )
        .await
        .unwrap());

    let tx_b = ledger.get_transaction(b).await.unwrap();
    assert!(tx_b.ref_id.is_none());
    assert_eq!(tx_b.status, TransactionStatus::NotCompleted);

    assert!(ledger
        .update_transaction(a, TransactionUpdate::new().ref_id(first_ref.clone()))
        .await
        .unwrap());
    assert_eq!(
        ledger.get_transaction(a).await.unwrap().ref_id,
        Some(first_ref)
    );
}

#[tokio::test]
async fn test_mysql_concurrent_ref_id_claims() {
    let Some(store) = setup_store().await else {
        return;
    };
    let ledger: Arc<dyn TransactionLedger> = store.ledger();
    let ref_id = unique_ref("RACE");

    let mut pay_ids = Vec::new();
    for i in 0..8 {
        pay_ids.push(ledger.save_transaction(i, "BankX", 100).await.unwrap());
    }

    let handles = pay_ids.iter().map(|&pay_id| {
        let ledger = Arc::clone(&ledger);
        let ref_id = ref_id.clone();
        tokio::spawn(async move {
            ledger
                .update_transaction(pay_id, TransactionUpdate::new().ref_id(ref_id))
                .await
                .unwrap()
        })
    });

    let winners = join_all(handles)
        .await
        .into_iter()
        .filter(|joined| *joined.as_ref().unwrap())
        .count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_mysql_call_audit_log() {
    let Some(store) = setup_store().await else {
        return;
    };
    let audit_log = store.audit_log();
    let pay_id = store.ledger().save_transaction(9, "BankX", 1).await.unwrap();

    audit_log.set_logging_enabled(false);
    let skipped = audit_log
        .log_method_call(pay_id, "requestPayment", json!({}))
        .await
        .unwrap();
    assert_eq!(skipped, CallLogId::NotLogged);

    audit_log.set_logging_enabled(true);
    let id = audit_log
        .log_method_call(pay_id, "requestPayment", json!({"amount": 1}))
        .await
        .unwrap();
    assert!(audit_log
        .log_method_response(id, Some(json!({"code": "00"})), Some(0))
        .await
        .unwrap());

    let calls = audit_log.calls_for_payment(pay_id).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].output, Some(json!({"code": "00"})));
    assert_eq!(calls[0].status_code, Some(0));
}
