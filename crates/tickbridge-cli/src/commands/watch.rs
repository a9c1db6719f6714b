//! Poll loop command. Task events are written to stdout as JSON lines;
//! diagnostics go to stderr via tracing.

use clap::Args;
use tickbridge_core::events::{EventSink, TaskEvent};
use tickbridge_core::ticktick::model::Snapshot;
use tickbridge_core::{BridgeConfig, PollEngine, PollOptions};

#[derive(Args)]
pub struct WatchArgs {
    /// Override the configured poll interval (seconds, 60-3600)
    #[arg(long)]
    pub interval: Option<u64>,
    /// Override the configured due-soon lookahead (minutes)
    #[arg(long)]
    pub due_soon: Option<i64>,
    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Prints each event as one JSON object per line.
struct JsonLineSink;

impl EventSink for JsonLineSink {
    fn emit(&self, event: &TaskEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "failed to encode event"),
        }
    }

    fn snapshot_replaced(&self, snapshot: &Snapshot) {
        tracing::info!(
            projects = snapshot.projects.len(),
            tasks = snapshot.task_count(),
            "snapshot refreshed"
        );
    }
}

pub fn run(args: WatchArgs) -> super::CliResult {
    let mut config = BridgeConfig::load()?;
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    if let Some(due_soon) = args.due_soon {
        config.due_soon_minutes = due_soon;
    }
    let config = config.normalized();

    let rt = super::runtime()?;
    let client = super::authenticated_client(&rt)?;
    let mut engine = PollEngine::new(client, PollOptions::from(&config), JsonLineSink);

    if args.once {
        let emitted = rt.block_on(engine.poll_once())?;
        tracing::info!(events = emitted, "single poll complete");
        return Ok(());
    }

    rt.block_on(async {
        tokio::select! {
            _ = engine.run() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping poll loop");
            }
        }
    });
    Ok(())
}
