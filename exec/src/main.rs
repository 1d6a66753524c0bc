//! Entry-point for the `recall-exec` binary: a headless feed session over a
//! JSON snapshot of the history/bookmark/favicon/metadata stores, printing
//! the notification stream to stdout.

use clap::Parser;
use recall_exec::Cli;
use recall_exec::run_main;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_main(cli))
}
