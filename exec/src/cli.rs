use std::path::PathBuf;

use clap::Parser;

/// Command-line interface for the headless `recall-exec` feed driver.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// JSON snapshot backing the history, bookmark, favicon, and metadata
    /// stores.
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Query window start, epoch milliseconds (inclusive).
    #[arg(long, value_name = "MS")]
    pub from: i64,

    /// Query window end, epoch milliseconds (inclusive).
    #[arg(long, value_name = "MS")]
    pub to: i64,

    /// Free-text filter; empty means everything in the window.
    #[arg(long, default_value = "")]
    pub search: String,

    /// JSONL file of raw places events to replay after the query settles.
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Print events as JSON Lines instead of human-readable text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// How long the feed may stay quiet before the driver moves on. The
    /// pipeline itself has no timeouts; this only bounds the headless run.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub idle_timeout_ms: u64,
}
