//! Gift Relay: watches source feeds for gift-code announcements, tracks
//! codes in a durable ledger, and republishes normalized announcements.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod store;
