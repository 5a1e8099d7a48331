//! In-memory sink that keeps every delivered announcement.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::channels::AnnouncementSink;
use crate::error::ChannelError;
use crate::pipeline::types::Announcement;

/// Collects announcements instead of publishing them (dry runs, tests).
#[derive(Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Announcement>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announcements delivered so far, in delivery order.
    pub async fn announcements(&self) -> Vec<Announcement> {
        self.delivered.lock().await.clone()
    }

    /// Rendered payloads delivered so far.
    pub async fn payloads(&self) -> Vec<String> {
        self.delivered
            .lock()
            .await
            .iter()
            .map(Announcement::payload)
            .collect()
    }
}

#[async_trait]
impl AnnouncementSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, announcement: &Announcement) -> Result<(), ChannelError> {
        self.delivered.lock().await.push(announcement.clone());
        Ok(())
    }
}
