//! CLI channel: events from stdin, announcements to stdout.
//!
//! Each stdin line is either a JSON `InboundEvent` or plain text, which is
//! attributed to the default channel as a body-only event.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{AnnouncementSink, EventSource, EventStream};
use crate::error::ChannelError;
use crate::pipeline::types::{Announcement, InboundEvent};

/// Author assigned to plain-text lines.
const LOCAL_AUTHOR: &str = "local-user";

/// Line-oriented stdin/stdout channel for local runs and piping.
pub struct CliChannel {
    default_channel_id: String,
}

impl CliChannel {
    pub fn new(default_channel_id: impl Into<String>) -> Self {
        Self {
            default_channel_id: default_channel_id.into(),
        }
    }
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str, default_channel_id: &str) -> Option<Result<InboundEvent, ChannelError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return Some(
            serde_json::from_str(line).map_err(|e| ChannelError::InvalidMessage(e.to_string())),
        );
    }
    Some(Ok(InboundEvent::text(default_channel_id, LOCAL_AUTHOR, line)))
}

#[async_trait]
impl EventSource for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let default_channel_id = self.default_channel_id.clone();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_line(&line, &default_channel_id) {
                        Some(Ok(event)) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => tracing::warn!("Skipping stdin line: {e}"),
                        None => {}
                    },
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl AnnouncementSink for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn deliver(&self, announcement: &Announcement) -> Result<(), ChannelError> {
        println!("{}\n", announcement.payload());
        Ok(())
    }
}
