//! Audit entries for gateway method calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::PayId;

/// Handle returned by `log_method_call`.
///
/// `NotLogged` is handed out while logging is disabled so callers can pass it
/// straight back to `log_method_response` without checking the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallLogId {
    NotLogged,
    Logged(u64),
}

impl CallLogId {
    pub fn is_logged(self) -> bool {
        matches!(self, CallLogId::Logged(_))
    }

    pub fn get(self) -> Option<u64> {
        match self {
            CallLogId::Logged(id) => Some(id),
            CallLogId::NotLogged => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallLogEntry {
    pub id: u64,
    pub payment_id: PayId,
    pub method_name: String,
    pub input: Value,
    pub output: Option<Value>,
    pub status_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Shared on/off switch for method-call logging.
///
/// Clones observe the same flag, so an admin path can hold one while the
/// audit log reads another.
#[derive(Debug, Clone, Default)]
pub struct LoggingSwitch(Arc<AtomicBool>);

impl LoggingSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}
