//! Persistence layer: libSQL-backed gift code ledger.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlLedger;
pub use traits::{CodeLedger, CodeRecord, Observation};
