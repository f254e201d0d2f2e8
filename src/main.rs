//! tally - personal task tracking CLI
//!
//! Tracks tasks per owner with priorities, start/end times, and a
//! Pending/Finished lifecycle, and reports aggregate statistics on demand.

use clap::Parser;
use tally::cli::Cli;
use tally::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG. Ignore invalid/huge filters so a bad
    // environment never breaks the CLI.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = cli.run() {
        tracing::debug!(command = %command, error = %err, "command failed");
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
