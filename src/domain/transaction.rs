//! Payment attempt entity and its status codes.
//! Framework-agnostic; adapters translate to and from their own row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// System-generated handle for one payment attempt.
pub type PayId = u64;

/// Caller-supplied business transaction identifier. Several payment attempts
/// may share one.
pub type TransactionId = i64;

/// Lifecycle status of a payment attempt.
///
/// Stored as the integer codes gateway integrations already exchange:
/// `VERIFIED = 1`, `SETTLED = 2`, `REVERSED = 3`, `IN_PROGRESS = 4`.
/// Any stored value below 1 reads back as [`TransactionStatus::NotCompleted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    NotCompleted,
    Verified,
    Settled,
    Reversed,
    InProgress,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 5] = [
        TransactionStatus::NotCompleted,
        TransactionStatus::InProgress,
        TransactionStatus::Verified,
        TransactionStatus::Settled,
        TransactionStatus::Reversed,
    ];

    pub fn code(self) -> i16 {
        match self {
            TransactionStatus::NotCompleted => 0,
            TransactionStatus::Verified => 1,
            TransactionStatus::Settled => 2,
            TransactionStatus::Reversed => 3,
            TransactionStatus::InProgress => 4,
        }
    }

    /// Decodes a stored code. Returns `None` for positive codes outside the
    /// known set.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            c if c < 1 => Some(TransactionStatus::NotCompleted),
            1 => Some(TransactionStatus::Verified),
            2 => Some(TransactionStatus::Settled),
            3 => Some(TransactionStatus::Reversed),
            4 => Some(TransactionStatus::InProgress),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::NotCompleted => "NOT_COMPLETED",
            TransactionStatus::Verified => "VERIFIED",
            TransactionStatus::Settled => "SETTLED",
            TransactionStatus::Reversed => "REVERSED",
            TransactionStatus::InProgress => "IN_PROGRESS",
        }
    }

    /// Advisory lifecycle:
    /// `NOT_COMPLETED -> IN_PROGRESS -> VERIFIED -> SETTLED`, with `REVERSED`
    /// reachable from `VERIFIED` or `SETTLED`. Forward moves may skip steps.
    /// Staying in the same status is always allowed.
    ///
    /// Ledgers do not enforce this themselves; see
    /// [`crate::services::TransitionGuard`].
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;

        if self == next {
            return true;
        }

        match (self, next) {
            (Reversed, _) => false,
            (_, Reversed) => matches!(self, Verified | Settled),
            (_, NotCompleted) => false,
            _ => next.rank() > self.rank(),
        }
    }

    fn rank(self) -> u8 {
        match self {
            TransactionStatus::NotCompleted => 0,
            TransactionStatus::InProgress => 1,
            TransactionStatus::Verified => 2,
            TransactionStatus::Settled => 3,
            TransactionStatus::Reversed => 4,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown transaction status: {}", s))
    }
}

/// One recorded payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub pay_id: PayId,
    pub transaction_id: TransactionId,
    pub bank_name: String,
    pub amount: i64,
    pub ref_id: Option<String>,
    pub authority_id: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(pay_id: PayId, transaction_id: TransactionId, bank_name: String, amount: i64) -> Self {
        let now = Utc::now();
        Self {
            pay_id,
            transaction_id,
            bank_name,
            amount,
            ref_id: None,
            authority_id: None,
            status: TransactionStatus::NotCompleted,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the mutable fields of a [`Transaction`].
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub ref_id: Option<String>,
    pub authority_id: Option<String>,
    pub status: Option<TransactionStatus>,
}

impl TransactionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    pub fn authority_id(mut self, authority_id: impl Into<String>) -> Self {
        self.authority_id = Some(authority_id.into());
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Reference id to claim, with empty strings treated as absent.
    pub fn claimed_ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref().filter(|r| !r.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.claimed_ref_id().is_none() && self.authority_id.is_none() && self.status.is_none()
    }
}
