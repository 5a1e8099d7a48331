//! Gift-code extraction and deduplication pipeline.
//!
//! Every inbound event flows through:
//! 1. `assembler::assemble()`: flatten body, embeds and files into text
//! 2. `Classifier::is_announcement()`: keyword match
//! 3. `extractor::extract()`: codes, expiry, VIP marker
//! 4. `CodeLedger::observe()`: per code, new vs recurring
//! 5. `composer::compose()`: outbound payload

pub mod assembler;
pub mod classifier;
pub mod composer;
pub mod extractor;
pub mod processor;
pub mod types;

pub use processor::Pipeline;
