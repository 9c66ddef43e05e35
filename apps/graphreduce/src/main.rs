//! # graphreduce
//!
//! The command-line binary for graphreduce-core.
//!
//! ## Usage
//!
//! ```bash
//! # Collapse degree-2 chains and keep the result
//! graphreduce contract -i edges.json --forbidden 3,4 -o reduced.grg
//!
//! # Minimum spanning forest, depth-first, labelled by component
//! graphreduce mst -g reduced.grg --order dfs --component
//!
//! # Graph statistics as JSON
//! graphreduce --json-mode info -i edges.json --directed
//! ```

use clap::Parser;
use graphreduce::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // GRAPHREDUCE_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr; stdout carries command output only.
    let log_format =
        std::env::var("GRAPHREDUCE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "graphreduce=debug"
    } else if cli.quiet {
        "graphreduce=warn"
    } else {
        "graphreduce=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
