pub mod in_memory;
pub mod mysql_call_audit_log;
pub mod mysql_ledger;

pub use in_memory::{InMemoryCallAuditLog, InMemoryLedger};
pub use mysql_call_audit_log::MySqlCallAuditLog;
pub use mysql_ledger::MySqlLedger;
