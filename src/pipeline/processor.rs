//! Per-event orchestration: assemble → classify → extract → observe →
//! compose → deliver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::channels::AnnouncementSink;
use crate::config::RelayConfig;
use crate::error::PipelineError;
use crate::pipeline::assembler;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::composer;
use crate::pipeline::extractor;
use crate::pipeline::types::{Announcement, ExtractionResult, InboundEvent};
use crate::store::CodeLedger;

/// Length of the text preview written to debug logs.
const PREVIEW_CHARS: usize = 120;

/// The relay pipeline. Holds no state between events beyond the ledger handle.
pub struct Pipeline {
    classifier: Classifier,
    ledger: Arc<dyn CodeLedger>,
}

impl Pipeline {
    pub fn new(config: &RelayConfig, ledger: Arc<dyn CodeLedger>) -> Self {
        Self {
            classifier: Classifier::from_config(config),
            ledger,
        }
    }

    /// Assemble, classify and extract without touching the ledger.
    ///
    /// Returns `None` when the event is not an announcement or carries no code.
    pub fn analyze(&self, event: &InboundEvent) -> Option<ExtractionResult> {
        let text = assembler::assemble(event);
        if text.is_empty() {
            return None;
        }

        let Some(keyword) = self.classifier.matched_keyword(&text) else {
            debug!(event_id = %event.id, "No keyword matched, skipping event");
            return None;
        };
        debug!(
            event_id = %event.id,
            keyword = keyword,
            preview = %preview(&text),
            "Matched keywords in event"
        );

        let extraction = extractor::extract(&text);
        if extraction.codes.is_empty() {
            debug!(event_id = %event.id, "Announcement without a code, nothing to relay");
            return None;
        }
        Some(extraction)
    }

    /// Process one event and deliver one announcement per distinct code.
    ///
    /// Codes are handled in first-seen order. A ledger failure stops the event
    /// at that code; codes before it stay recorded and delivered. Delivery
    /// failures are logged only.
    pub async fn handle(
        &self,
        event: &InboundEvent,
        observed_at: DateTime<Utc>,
        sink: &dyn AnnouncementSink,
    ) -> Result<Vec<Announcement>, PipelineError> {
        let Some(extraction) = self.analyze(event) else {
            return Ok(Vec::new());
        };

        let mut announced = Vec::with_capacity(extraction.codes.len());
        for code in &extraction.codes {
            let observation = self
                .ledger
                .observe(code, observed_at, extraction.expiry, extraction.is_vip)
                .await
                .map_err(|source| {
                    error!(code = %code, "Ledger observation failed: {source}");
                    PipelineError::Ledger {
                        code: code.clone(),
                        source,
                    }
                })?;

            let announcement =
                composer::resolve(code, extraction.expiry, extraction.is_vip, &observation);
            info!(
                code = %announcement.code,
                recurring = announcement.recurring,
                vip = announcement.is_vip,
                "Reposting code"
            );

            if let Err(e) = sink.deliver(&announcement).await {
                warn!(code = %announcement.code, sink = sink.name(), "Delivery failed: {e}");
            }
            announced.push(announcement);
        }
        Ok(announced)
    }
}

/// First `PREVIEW_CHARS` characters, with an ellipsis if truncated.
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
