use std::sync::Arc;

use anyhow::Context;

use gift_relay::channels::{AnnouncementSink, CliChannel, EventSource, WebhookSink};
use gift_relay::config::RelayConfig;
use gift_relay::pipeline::Pipeline;
use gift_relay::relay::Relay;
use gift_relay::store::{CodeLedger, LibSqlLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(RelayConfig::from_env().context("invalid relay configuration")?);

    eprintln!("🎁 Gift Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Keywords: {}", config.keywords.join(", "));
    if config.source_channel_ids.is_empty() {
        eprintln!("   Sources: none (set SOURCE_CHANNEL_IDS; every event will be ignored)");
    } else {
        eprintln!("   Sources: {}", config.source_channel_ids.join(", "));
    }

    // ── Ledger ──────────────────────────────────────────────────────────
    let ledger: Arc<dyn CodeLedger> = Arc::new(
        LibSqlLedger::new_local(&config.db_path)
            .await
            .with_context(|| format!("failed to open ledger at {}", config.db_path.display()))?,
    );
    let tracked = ledger.count().await.context("failed to read ledger")?;
    eprintln!("   Ledger: {} ({} codes tracked)", config.db_path.display(), tracked);

    // ── Channels ────────────────────────────────────────────────────────
    let default_channel = config
        .source_channel_ids
        .first()
        .cloned()
        .unwrap_or_else(|| "cli".to_string());
    let source = CliChannel::new(default_channel.clone());

    let sink: Arc<dyn AnnouncementSink> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.clone())),
        None => Arc::new(CliChannel::new(default_channel)),
    };
    eprintln!("   Output: {}\n", sink.name());

    // ── Relay ───────────────────────────────────────────────────────────
    let pipeline = Arc::new(Pipeline::new(&config, Arc::clone(&ledger)));
    let relay = Relay::new(Arc::clone(&config), pipeline, sink);

    let events = source
        .start()
        .await
        .with_context(|| format!("failed to start {} source", EventSource::name(&source)))?;
    relay.run(events).await;

    Ok(())
}
