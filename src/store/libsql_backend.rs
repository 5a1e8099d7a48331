//! libSQL backend: durable `CodeLedger` implementation.
//!
//! File databases run in WAL mode with `synchronous=FULL`, so an
//! acknowledged `observe` survives a crash. Observations are serialized by
//! a write lock and each runs inside a `BEGIN IMMEDIATE` transaction.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{CodeLedger, CodeRecord, Observation};

/// libSQL ledger backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlLedger {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    write_lock: Mutex<()>,
}

impl LibSqlLedger {
    /// Open (or create) a local database file, enable WAL, and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Pool(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let ledger = Self::from_database(db)?;
        let journal_mode = ledger.configure_durability().await?;
        migrations::run_migrations(ledger.conn()).await?;
        info!(path = %path.display(), journal_mode = %journal_mode, "Ledger opened");
        Ok(ledger)
    }

    /// Create an in-memory ledger (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let ledger = Self::from_database(db)?;
        migrations::run_migrations(ledger.conn()).await?;
        Ok(ledger)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Switch to WAL with full fsync. Returns the resulting journal mode.
    async fn configure_durability(&self) -> Result<String, DatabaseError> {
        let conn = self.conn();
        let mode = pragma(conn, "journal_mode = WAL").await?.unwrap_or_default();
        pragma(conn, "synchronous = FULL").await?;
        pragma(conn, "busy_timeout = 5000").await?;
        if !mode.eq_ignore_ascii_case("wal") {
            tracing::warn!(journal_mode = %mode, "Ledger is not running in WAL mode");
        }
        Ok(mode)
    }

    /// Read-modify-write for one code. Caller holds the write lock and an
    /// open transaction.
    async fn observe_in_tx(
        &self,
        code: &str,
        observed_at: DateTime<Utc>,
        expiry: Option<NaiveDate>,
        is_vip: bool,
    ) -> Result<Observation, DatabaseError> {
        let Some(existing) = self.get_record(code).await? else {
            let seen = observed_at.to_rfc3339();
            self.conn()
                .execute(
                    "INSERT INTO giftcodes (code, first_seen, last_seen, expiry, is_vip)
                     VALUES (?1, ?2, ?2, ?3, ?4)",
                    params![code, seen, opt_date(expiry), is_vip as i64],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("observe insert: {e}")))?;
            debug!(code = code, "Code recorded for the first time");
            return Ok(Observation::new_code());
        };

        // last_seen never moves backwards, keeping first_seen <= last_seen.
        let last_seen = observed_at.max(existing.last_seen);
        self.conn()
            .execute(
                "UPDATE giftcodes
                 SET last_seen = ?1,
                     expiry = COALESCE(?2, expiry),
                     is_vip = MAX(COALESCE(is_vip, 0), ?3)
                 WHERE code = ?4",
                params![last_seen.to_rfc3339(), opt_date(expiry), is_vip as i64, code],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("observe update: {e}")))?;

        debug!(code = code, "Known code observed again");
        Ok(Observation {
            is_new: false,
            prior_expiry: existing.expiry,
            prior_vip: existing.is_vip,
        })
    }

    async fn get_record(&self, code: &str) -> Result<Option<CodeRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CODE_COLUMNS} FROM giftcodes WHERE code = ?1"),
                params![code],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let record = row_to_record(&row)
                    .map_err(|e| DatabaseError::Serialization(format!("get row parse: {e}")))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

const CODE_COLUMNS: &str = "code, first_seen, last_seen, expiry, is_vip";

/// Run a PRAGMA and return its first value, if it produced one.
async fn pragma(conn: &Connection, statement: &str) -> Result<Option<String>, DatabaseError> {
    let mut rows = conn
        .query(&format!("PRAGMA {statement}"), ())
        .await
        .map_err(|e| DatabaseError::Pool(format!("PRAGMA {statement}: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => match row.get_value(0) {
            Ok(libsql::Value::Text(s)) => Ok(Some(s)),
            Ok(libsql::Value::Integer(i)) => Ok(Some(i.to_string())),
            _ => Ok(None),
        },
        Ok(None) => Ok(None),
        Err(e) => Err(DatabaseError::Pool(format!("PRAGMA {statement}: {e}"))),
    }
}

/// Parse an RFC 3339 or naive ISO-8601 / SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try RFC 3339 first (our canonical write format)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // Naive values are UTC
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, format) {
            return ndt.and_utc();
        }
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Convert `Option<NaiveDate>` to libsql Value.
fn opt_date(d: Option<NaiveDate>) -> libsql::Value {
    match d {
        Some(d) => libsql::Value::Text(d.format("%Y-%m-%d").to_string()),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a CodeRecord.
///
/// Column order matches CODE_COLUMNS:
/// 0:code, 1:first_seen, 2:last_seen, 3:expiry, 4:is_vip
fn row_to_record(row: &libsql::Row) -> Result<CodeRecord, libsql::Error> {
    let code: String = row.get(0)?;
    let first_str: String = row.get(1)?;
    let last_str: String = row.get(2)?;
    let expiry = match row.get_value(3)? {
        libsql::Value::Text(s) => parse_date(&s),
        _ => None,
    };
    let is_vip = match row.get_value(4)? {
        libsql::Value::Integer(i) => i != 0,
        libsql::Value::Text(s) => s.trim() == "1",
        _ => false,
    };

    Ok(CodeRecord {
        code,
        first_seen: parse_datetime(&first_str),
        last_seen: parse_datetime(&last_str),
        expiry,
        is_vip,
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl CodeLedger for LibSqlLedger {
    async fn observe(
        &self,
        code: &str,
        observed_at: DateTime<Utc>,
        expiry: Option<NaiveDate>,
        is_vip: bool,
    ) -> Result<Observation, DatabaseError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.conn();

        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("observe begin: {e}")))?;

        let result = self.observe_in_tx(code, observed_at, expiry, is_vip).await;
        let result = match result {
            Ok(observation) => conn
                .execute("COMMIT", ())
                .await
                .map(|_| observation)
                .map_err(|e| DatabaseError::Query(format!("observe commit: {e}"))),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = conn.execute("ROLLBACK", ()).await {
                tracing::warn!(code = code, "Rollback after failed observe: {e}");
            }
        }
        result
    }

    async fn get(&self, code: &str) -> Result<Option<CodeRecord>, DatabaseError> {
        self.get_record(code).await
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM giftcodes", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("count: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Serialization(format!("count: {e}")))?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count: {e}"))),
        }
    }
}
