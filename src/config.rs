//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Classification phrases used when `KEYWORDS` is not set.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "gift code",
    "giftcode",
    "voucher",
    "redeem",
    "chief concierge",
    "concierge",
    "vip",
];

/// Relay configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Lower-cased classification phrases, in configured order.
    pub keywords: Vec<String>,
    /// Source channel identifiers the relay watches. Opaque to the pipeline.
    pub source_channel_ids: Vec<String>,
    /// Author identity of the relay itself; events from it are dropped.
    pub self_author_id: Option<String>,
    /// Path of the ledger database file.
    pub db_path: PathBuf,
    /// Number of pipeline workers.
    pub workers: usize,
    /// Outbound webhook. Announcements go to stdout when unset.
    pub webhook_url: Option<SecretString>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            source_channel_ids: Vec::new(),
            self_author_id: None,
            db_path: PathBuf::from("giftcodes.sqlite3"),
            workers: 4,
            webhook_url: None,
        }
    }
}

impl RelayConfig {
    /// Build a configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let keywords = match std::env::var("KEYWORDS") {
            Ok(raw) => parse_keywords(&raw),
            Err(_) => defaults.keywords,
        };

        let source_channel_ids = split_list(&std::env::var("SOURCE_CHANNEL_IDS").unwrap_or_default());

        let self_author_id = std::env::var("RELAY_SELF_ID")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let db_path = std::env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let workers = match std::env::var("RELAY_WORKERS") {
            Ok(raw) => parse_workers(&raw)?,
            Err(_) => defaults.workers,
        };

        let webhook_url = std::env::var("TARGET_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            keywords,
            source_channel_ids,
            self_author_id,
            db_path,
            workers,
            webhook_url,
        })
    }

    /// Whether events from `channel_id` should be processed.
    pub fn watches(&self, channel_id: &str) -> bool {
        self.source_channel_ids.iter().any(|id| id == channel_id)
    }
}

/// Split a comma-separated keyword list, lower-casing each phrase.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    split_list(raw).into_iter().map(|k| k.to_lowercase()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_workers(raw: &str) -> Result<usize, ConfigError> {
    let workers: usize = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: "RELAY_WORKERS".into(),
        message: format!("{e}"),
    })?;
    if workers == 0 {
        return Err(ConfigError::InvalidValue {
            key: "RELAY_WORKERS".into(),
            message: "must be at least 1".into(),
        });
    }
    Ok(workers)
}
