//! Transport abstraction: where events come from and announcements go.

pub mod cli;
pub mod memory;
pub mod webhook;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::pipeline::types::{Announcement, InboundEvent};

pub use cli::CliChannel;
pub use memory::MemorySink;
pub use webhook::WebhookSink;

/// Stream of inbound events from a source.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A transport that produces inbound events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Start listening. The stream ends when the transport closes.
    async fn start(&self) -> Result<EventStream, ChannelError>;
}

/// A transport that publishes composed announcements.
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    /// Sink name for logging.
    fn name(&self) -> &str;

    /// Deliver one announcement.
    async fn deliver(&self, announcement: &Announcement) -> Result<(), ChannelError>;
}
