//! Shared types for the relay pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Inbound event ───────────────────────────────────────────────────

/// Unified inbound chat event from any transport.
///
/// Transports convert their native message shape into this struct. The
/// pipeline never sees platform objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport-native message ID (used only for logging).
    #[serde(default)]
    pub id: String,
    /// Source channel the event was posted in.
    pub channel_id: String,
    /// Author identity.
    pub author_id: String,
    /// Human-readable author name, if the transport provides one.
    #[serde(default)]
    pub author_name: Option<String>,
    /// Primary body text.
    #[serde(default)]
    pub content: String,
    /// Embeds and file attachments, in arrival order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// When the transport received the event.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Build a plain-text event with no attachments.
    pub fn text(channel_id: &str, author_id: &str, content: &str) -> Self {
        Self {
            id: String::new(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            author_name: None,
            content: content.into(),
            attachments: Vec::new(),
            received_at: Utc::now(),
        }
    }

    /// Attach an embed or file.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Attachment-like sub-object of an event.
///
/// Forwarders often put the whole announcement into an embed, so every
/// text-bearing part is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// Rich embed, as carried by forwarded messages.
    Embed {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        fields: Vec<EmbedField>,
        #[serde(default)]
        footer: Option<String>,
        #[serde(default)]
        author_name: Option<String>,
    },
    /// Uploaded file.
    File {
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

/// Name/value pair inside an embed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

// ── Text fragments ──────────────────────────────────────────────────

/// One text-bearing piece of an event, independent of transport shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFragment<'a> {
    Body(&'a str),
    AttachmentTitle(&'a str),
    AttachmentDescription(&'a str),
    FieldPair { name: &'a str, value: &'a str },
    Footer(&'a str),
    AuthorName(&'a str),
    Filename(&'a str),
}

impl<'a> TextFragment<'a> {
    /// The non-blank strings this fragment contributes, in order.
    pub fn texts(&self) -> Vec<&'a str> {
        let raw: Vec<&'a str> = match *self {
            Self::Body(s)
            | Self::AttachmentTitle(s)
            | Self::AttachmentDescription(s)
            | Self::Footer(s)
            | Self::AuthorName(s)
            | Self::Filename(s) => vec![s],
            Self::FieldPair { name, value } => vec![name, value],
        };
        raw.into_iter().filter(|s| !s.trim().is_empty()).collect()
    }
}

// ── Extraction result ───────────────────────────────────────────────

/// Structured fields pulled out of one event's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Normalized (upper-case) code tokens, deduplicated, first-seen order.
    pub codes: Vec<String>,
    /// Expiry date found in the text, if any.
    pub expiry: Option<NaiveDate>,
    /// Whether a VIP / concierge marker was found.
    pub is_vip: bool,
}

// ── Announcement ────────────────────────────────────────────────────

/// Outbound announcement for a single code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub code: String,
    /// Best known expiry: extracted now, else previously stored.
    pub expiry: Option<NaiveDate>,
    /// Extracted VIP flag OR previously stored flag.
    pub is_vip: bool,
    /// True iff the ledger knew the code before this observation.
    pub recurring: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pair_yields_name_then_value() {
        let fragment = TextFragment::FieldPair {
            name: "Code",
            value: "ABCDEF12",
        };
        assert_eq!(fragment.texts(), vec!["Code", "ABCDEF12"]);
    }

    #[test]
    fn blank_fragments_yield_nothing() {
        assert!(TextFragment::Footer("").texts().is_empty());
        assert!(TextFragment::Body("   \n").texts().is_empty());
        let pair = TextFragment::FieldPair {
            name: "",
            value: "value",
        };
        assert_eq!(pair.texts(), vec!["value"]);
    }

    #[test]
    fn inbound_event_deserializes_with_defaults() {
        let json = r#"{
            "channel_id": "111",
            "author_id": "42",
            "attachments": [
                {"kind": "embed", "title": "Gift code", "fields": [{"name": "Code", "value": "ABCDEF12"}]},
                {"kind": "file", "filename": "codes.png"}
            ]
        }"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.channel_id, "111");
        assert!(event.content.is_empty());
        assert_eq!(event.attachments.len(), 2);
        match &event.attachments[0] {
            Attachment::Embed { title, fields, .. } => {
                assert_eq!(title.as_deref(), Some("Gift code"));
                assert_eq!(fields[0].value, "ABCDEF12");
            }
            other => panic!("Expected embed, got {:?}", other),
        }
        assert!(matches!(event.attachments[1], Attachment::File { .. }));
    }
}
