//! # graphreduce CLI Module
//!
//! This module implements the CLI interface for graphreduce.
//!
//! ## Available Commands
//!
//! - `contract` - Collapse linear vertices into shortcut edges
//! - `mst` - Compute a minimum spanning forest
//! - `info` - Show graph statistics

mod commands;

use crate::config::{Config, Flags};
use clap::{Args, Parser, Subcommand};
use graphreduce_core::{GraphError, OrderBy};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// graphreduce - graph reduction toolkit
///
/// Contracts chains of degree-2 vertices and computes minimum spanning
/// forests over weighted edge lists.
#[derive(Parser, Debug)]
#[command(name = "graphreduce")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Where a command reads its graph from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct GraphSource {
    /// JSON edge list (array of {id, source, target, cost, reverse_cost})
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Snapshot written by `contract --output`
    #[arg(short, long)]
    pub graph: Option<PathBuf>,
}

/// Edge direction, overriding `directed` from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Direction {
    /// Treat edges as one-way
    #[arg(long, conflicts_with = "undirected")]
    pub directed: bool,

    /// Treat edges as two-way
    #[arg(long)]
    pub undirected: bool,
}

impl Direction {
    /// `None` when neither flag was given.
    #[must_use]
    pub fn choice(&self) -> Option<bool> {
        switch(self.directed, self.undirected)
    }
}

/// An on/off flag pair: `Some` only when one of them was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collapse linear vertices into shortcut edges
    Contract {
        #[command(flatten)]
        source: GraphSource,

        #[command(flatten)]
        direction: Direction,

        /// Vertices that must never be contracted (comma-separated)
        #[arg(long)]
        forbidden: Option<String>,

        /// Write the contracted graph as a snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute a minimum spanning forest
    Mst {
        #[command(flatten)]
        source: GraphSource,

        // the forest ignores direction; it only affects loading
        #[command(flatten)]
        direction: Direction,

        /// Row order: none, dfs, bfs (or 0, 1, 2)
        #[arg(long)]
        order: Option<OrderBy>,

        /// Label rows with their component representative
        #[arg(long, conflicts_with = "no_component")]
        component: bool,

        /// Leave rows unlabelled, overriding the config file
        #[arg(long)]
        no_component: bool,
    },

    /// Show graph statistics
    Info {
        #[command(flatten)]
        source: GraphSource,

        #[command(flatten)]
        direction: Direction,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Commands {
    /// The flags of this command that override the config file.
    #[must_use]
    pub fn flags(&self) -> Flags {
        match self {
            Commands::Contract {
                direction,
                forbidden,
                ..
            } => Flags {
                directed: direction.choice(),
                forbidden: forbidden.clone(),
                ..Flags::default()
            },
            Commands::Mst {
                direction,
                order,
                component,
                no_component,
                ..
            } => Flags {
                directed: direction.choice(),
                order: *order,
                component: switch(*component, *no_component),
                ..Flags::default()
            },
            Commands::Info { direction, .. } => Flags {
                directed: direction.choice(),
                ..Flags::default()
            },
        }
    }
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphError> {
    let config = Config::load(cli.config.as_deref())?;
    let settings = config.resolve(&cli.command.flags())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Contract { source, output, .. } => {
            cmd_contract(&source, &settings, output.as_deref(), json_mode)
        }
        Commands::Mst { source, .. } => cmd_mst(&source, &settings, json_mode),
        Commands::Info { source, .. } => cmd_info(&source, &settings, json_mode),
    }
}
