//! CLI definitions for PageMind.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PageMind CLI.
#[derive(Parser)]
#[command(name = "pagemind")]
#[command(about = "On-device page assistant: summarize, analyze and chat about web pages")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Serve JSON-lines requests on stdin, responses on stdout (default)
    Serve,

    /// Summarize a text file and print the summary
    Summarize {
        /// File with the page text
        #[arg(short, long)]
        file: PathBuf,

        /// What the summary should focus on
        #[arg(long)]
        focus: Option<String>,
    },

    /// Run one TTL sweep over the store and report what was removed
    Sweep,
}
