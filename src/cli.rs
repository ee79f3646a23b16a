// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jot",
    about = "Context-capture assistant backend: task orchestration and agent spawning",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one task: spawn the agent(s) for a task type and run them
    /// against the given input.
    Run {
        /// Task type to execute (see `jot list-agents`)
        task_type: String,

        /// Captured text the task operates on.  Read from stdin when omitted.
        #[arg(long, short = 't')]
        text: Option<String>,

        /// The user's instruction for this task
        #[arg(long, short = 'i')]
        instruction: Option<String>,

        /// Source URL accompanying the capture.  May be repeated.
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,

        /// Acting user id (UUID).  A fresh id is generated when omitted.
        #[arg(long, short = 'u')]
        user: Option<String>,

        /// Print the full orchestration result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an agent registry file (or the built-in registry), then exit.
    /// Exits 0 if valid, non-zero with an error description otherwise.
    Validate {
        /// Registry YAML to validate; the built-in registry when omitted
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// List registered task types and their blueprints.
    ListAgents {
        /// Only blueprints providing this capability (e.g. "tabular_write")
        #[arg(long)]
        capability: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all supported reasoning providers.
    ListProviders {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration and exit
    ShowConfig,
}
