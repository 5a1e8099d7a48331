//! `CodeLedger` trait: the single writer of code tracking records.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DatabaseError;

/// A persisted code tracking record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// Normalized code, primary key.
    pub code: String,
    /// Set on creation, never changed.
    pub first_seen: DateTime<Utc>,
    /// Updated on every observation.
    pub last_seen: DateTime<Utc>,
    /// Replaced only by a newer non-null value.
    pub expiry: Option<NaiveDate>,
    /// Sticky once true.
    pub is_vip: bool,
}

/// What the ledger knew about a code before an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// No record existed before this call.
    pub is_new: bool,
    /// Stored expiry before this call.
    pub prior_expiry: Option<NaiveDate>,
    /// Stored VIP flag before this call.
    pub prior_vip: bool,
}

impl Observation {
    /// Result of observing a code for the first time.
    pub fn new_code() -> Self {
        Self {
            is_new: true,
            prior_expiry: None,
            prior_vip: false,
        }
    }
}

/// Durable code → record store.
///
/// `observe` must be atomic per code: concurrent observations of the same
/// code never interleave their read-modify-write.
#[async_trait]
pub trait CodeLedger: Send + Sync {
    /// Insert or merge a record and report the state before the call.
    ///
    /// New code: record created with `first_seen = last_seen = observed_at`.
    /// Known code: `last_seen` bumped, `expiry` replaced only if `expiry` is
    /// `Some`, `is_vip` OR'd.
    async fn observe(
        &self,
        code: &str,
        observed_at: DateTime<Utc>,
        expiry: Option<NaiveDate>,
        is_vip: bool,
    ) -> Result<Observation, DatabaseError>;

    /// Look up the stored record for a code.
    async fn get(&self, code: &str) -> Result<Option<CodeRecord>, DatabaseError>;

    /// Number of tracked codes.
    async fn count(&self) -> Result<u64, DatabaseError>;
}
