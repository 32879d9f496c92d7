pub mod call_log;
pub mod transaction;

pub use call_log::{CallLogEntry, CallLogId, LoggingSwitch};
pub use transaction::{PayId, Transaction, TransactionId, TransactionStatus, TransactionUpdate};
