//! Relay host loop: filters inbound events and feeds them to pipeline workers.
//!
//! Events from one source channel always land on the same worker, so they
//! are processed in arrival order. Different channels run concurrently.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::channels::{AnnouncementSink, EventStream};
use crate::config::RelayConfig;
use crate::pipeline::processor::Pipeline;
use crate::pipeline::types::InboundEvent;

/// Per-worker queue capacity.
const WORKER_QUEUE_CAPACITY: usize = 64;

/// Counters reported when a relay run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Events accepted by the source filter.
    pub dispatched: u64,
    /// Events dropped by the source/self filter.
    pub filtered: u64,
}

/// Hosts the pipeline behind a source filter and a worker pool.
pub struct Relay {
    config: Arc<RelayConfig>,
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn AnnouncementSink>,
}

impl Relay {
    pub fn new(
        config: Arc<RelayConfig>,
        pipeline: Arc<Pipeline>,
        sink: Arc<dyn AnnouncementSink>,
    ) -> Self {
        Self {
            config,
            pipeline,
            sink,
        }
    }

    /// Whether an event passes the source and self-author filters.
    pub fn accepts(&self, event: &InboundEvent) -> bool {
        if self
            .config
            .self_author_id
            .as_deref()
            .is_some_and(|me| me == event.author_id)
        {
            return false;
        }
        self.config.watches(&event.channel_id)
    }

    /// Consume the stream until it ends, then wait for queued events to finish.
    pub async fn run(&self, mut events: EventStream) -> RelayStats {
        let workers = self.config.workers.max(1);
        let mut senders = Vec::with_capacity(workers);
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let (tx, rx) = mpsc::channel(WORKER_QUEUE_CAPACITY);
            senders.push(tx);
            handles.push(spawn_worker(
                worker_id,
                rx,
                Arc::clone(&self.pipeline),
                Arc::clone(&self.sink),
            ));
        }
        info!(workers, sink = self.sink.name(), "Relay started");

        let mut stats = RelayStats::default();
        while let Some(event) = events.next().await {
            if !self.accepts(&event) {
                debug!(
                    channel = %event.channel_id,
                    author = %event.author_id,
                    "Event filtered out"
                );
                stats.filtered += 1;
                continue;
            }

            debug!(
                channel = %event.channel_id,
                author = %event.author_id,
                "Seen event in source channel"
            );
            let idx = worker_for(&event.channel_id, workers);
            if senders[idx].send(event).await.is_err() {
                error!(worker = idx, "Worker stopped, dropping event");
                continue;
            }
            stats.dispatched += 1;
        }

        drop(senders);
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Relay worker panicked: {e}");
            }
        }
        info!(
            dispatched = stats.dispatched,
            filtered = stats.filtered,
            "Relay stopped"
        );
        stats
    }
}

/// Stable worker index for a source channel.
fn worker_for(channel_id: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    channel_id.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

fn spawn_worker(
    worker_id: usize,
    mut rx: mpsc::Receiver<InboundEvent>,
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn AnnouncementSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = pipeline.handle(&event, Utc::now(), sink.as_ref()).await {
                error!(
                    worker = worker_id,
                    event_id = %event.id,
                    channel = %event.channel_id,
                    "Event processing aborted: {e}"
                );
            }
        }
        debug!(worker = worker_id, "Worker finished");
    })
}
