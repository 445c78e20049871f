//! CLI argument definitions for the FMV Tracker.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fmv",
    version,
    about = "FMV Tracker - consolidate and validate credit line, disbursement, document and contact sheets",
    long_about = "Consolidate the CSV and Excel exports of an FMV tracking folder.\n\n\
                  Files are matched to domains by name (lineas, desembolsos, splaft, contactos),\n\
                  normalized, validated and merged; the latest as-of date wins."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values (names, e-mails, phones) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Consolidate a folder of CSV and Excel exports.
    Run(RunArgs),

    /// List the tracked domains and their canonical fields.
    Domains,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Folder containing the CSV and Excel exports.
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// TOML file with thresholds, synonyms and status aliases.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reference date for alerts and date checks (default: the local date).
    #[arg(long = "today", value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// As-of date for files without a date in their name.
    #[arg(long = "as-of", value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Days ahead of `today` in which an expiring credit line is flagged.
    #[arg(long = "lookahead-days", value_name = "N")]
    pub lookahead_days: Option<i64>,

    /// Output directory for exports (default: <FOLDER>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Validate and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
