use thiserror::Error;

use crate::domain::TransactionStatus;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn transaction_not_found(pay_id: u64) -> Self {
        LedgerError::NotFound {
            entity: "transaction",
            id: pay_id,
        }
    }

    pub fn call_not_found(id: u64) -> Self {
        LedgerError::NotFound {
            entity: "method call",
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}
