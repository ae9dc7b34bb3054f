//! Command-line interface for tabsync

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabsync")]
#[command(about = "Diff tables, compile diffs to batched SQL and sync tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON file with engine settings; flags override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options shared by every command that reads or writes diff streams
#[derive(Args, Debug, Clone, Default)]
pub struct StreamOptions {
    /// Comma-separated key columns used to correlate rows and narrow predicates
    #[arg(long, value_parser = validate_key)]
    pub key: Option<String>,

    /// Header labels carry `name type` instead of bare names
    #[arg(long)]
    pub typed_header: bool,

    /// Use tab instead of comma as the diff stream delimiter
    #[arg(short = 't', long)]
    pub tab: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diff two tables or queries and print the diff stream
    Diff {
        /// Database holding the old rows
        db1: String,

        /// Database holding the new rows
        db2: String,

        /// Table name or query read from the first database
        source1: String,

        /// Table name or query read from the second database (defaults to source1)
        source2: Option<String>,

        #[command(flatten)]
        stream: StreamOptions,

        /// Write the diff stream to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compile a diff stream into SQL statements with parameter rows
    Diff2sql {
        /// Table the statements are written for
        table: String,

        #[command(flatten)]
        stream: StreamOptions,

        /// Read the diff stream from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output format: "sql" or "json"
        #[arg(long, default_value = "sql")]
        format: String,
    },

    /// Apply a diff stream to a database table
    Patch {
        /// Database to patch
        db: String,

        /// Table to patch
        table: String,

        #[command(flatten)]
        stream: StreamOptions,

        /// Read the diff stream from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Make a destination table match a source
    Sync {
        /// Source database
        src_db: String,

        /// Destination database
        dest_db: String,

        /// Source table name or query
        source: String,

        /// Destination table name or query (defaults to source)
        dest: Option<String>,

        /// Table written to when it differs from the destination read
        #[arg(long)]
        target_table: Option<String>,

        #[command(flatten)]
        stream: StreamOptions,

        /// Show what would change without applying it
        #[arg(long)]
        dry_run: bool,

        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Validate that a key lists at least one non-empty column
fn validate_key(s: &str) -> Result<String, String> {
    crate::model::Key::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}
