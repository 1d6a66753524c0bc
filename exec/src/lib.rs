mod cli;
mod event_processor;
mod event_processor_with_human_output;
mod event_processor_with_json_output;
pub mod snapshot;

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Context;
pub use cli::Cli;
use recall_core::Feed;
use recall_protocol::Query;
use recall_protocol::RawPlacesEvent;
use recall_protocol::protocol::EventMsg;
use recall_protocol::protocol::Op;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::event_processor::EventProcessor;
use crate::event_processor_with_human_output::EventProcessorWithHumanOutput;
use crate::event_processor_with_json_output::EventProcessorWithJsonOutput;
use crate::snapshot::Snapshot;
use crate::snapshot::SnapshotSource;

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let default_level = "warn";
    let stderr_with_ansi = std::io::stderr().is_terminal();
    let _ = tracing_subscriber::fmt()
        // Fallback to the `default_level` log filter if the environment
        // variable is not set _or_ contains an invalid value.
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(stderr_with_ansi)
        .with_writer(std::io::stderr)
        .try_init();

    let snapshot = Snapshot::load(&cli.snapshot)?;
    info!(
        history = snapshot.history.len(),
        bookmarks = snapshot.bookmarks.len(),
        "snapshot loaded"
    );
    let source = SnapshotSource::new(snapshot);
    let spawned = Feed::spawn(source.services());
    let feed = spawned.feed;

    let mut processor: Box<dyn EventProcessor> = if cli.json {
        Box::new(EventProcessorWithJsonOutput)
    } else {
        Box::new(EventProcessorWithHumanOutput::create_with_ansi(
            std::io::stdout().is_terminal(),
        ))
    };

    let idle = Duration::from_millis(cli.idle_timeout_ms);

    feed.submit(Op::RunQuery {
        query: Query {
            date_start: cli.from,
            date_end: cli.to,
            text: cli.search.clone(),
        },
    })
    .await?;
    drain_until_idle(&feed, processor.as_mut(), idle).await;

    if let Some(path) = &cli.events {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read events file {}", path.display()))?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: RawPlacesEvent = serde_json::from_str(line)
                .with_context(|| format!("bad raw event line: {line}"))?;
            feed.submit(Op::PlacesEvent { event }).await?;
        }
        drain_until_idle(&feed, processor.as_mut(), idle).await;
    }

    feed.submit(Op::Shutdown).await?;
    while let Ok(event) = feed.next_event().await {
        let done = matches!(event.msg, EventMsg::ShutdownComplete);
        processor.process_event(&event);
        if done {
            break;
        }
    }
    Ok(())
}

/// Pump notifications to the processor until the feed stays quiet for
/// `idle`. Lookups that never resolve are an accepted degradation; this
/// cutoff only bounds the headless run, not the pipeline.
async fn drain_until_idle(feed: &Feed, processor: &mut dyn EventProcessor, idle: Duration) {
    while let Ok(Ok(event)) = tokio::time::timeout(idle, feed.next_event()).await {
        processor.process_event(&event);
    }
}
