pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod store;
pub mod validation;

pub use domain::{
    CallLogEntry, CallLogId, LoggingSwitch, PayId, Transaction, TransactionId, TransactionStatus,
    TransactionUpdate,
};
pub use error::{LedgerError, LedgerResult};
pub use ports::{CallAuditLog, TransactionLedger};
pub use store::PaymentStore;
