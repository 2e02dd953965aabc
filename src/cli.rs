//! Command-line interface definitions for drivedupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan the drive, token taken from DRIVEDUPE_ACCESS_TOKEN
//! drivedupe scan
//!
//! # Scan with an OAuth token file and JSON output
//! drivedupe scan --token-file token.json --output json
//!
//! # Only resolve paths for files that have duplicates
//! drivedupe scan --resolve duplicates --min-size 1MB
//!
//! # Re-render a saved session as CSV
//! drivedupe load session.json --output csv
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::duplicates::ResolveScope;

/// Find duplicate files in a cloud drive.
///
/// drivedupe lists every file in the drive, groups files that share a content
/// hash, and reports each duplicate with the folder path it lives in.
#[derive(Debug, Parser)]
#[command(name = "drivedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for drivedupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the drive for duplicate files
    Scan(ScanArgs),
    /// Render a previously saved session
    Load(LoadArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// OAuth access token for the Drive API
    #[arg(long, value_name = "TOKEN", env = "DRIVEDUPE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// JSON file holding an "access_token" field
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Scan an offline snapshot instead of the live drive
    #[arg(long, value_name = "PATH", conflicts_with = "token_file")]
    pub snapshot: Option<PathBuf>,

    /// Output format (default: text, or the configured format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Which files get their folder path resolved
    #[arg(long, value_enum, value_name = "SCOPE")]
    pub resolve: Option<ResolveScope>,

    /// Files requested per listing page (1-1000)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: Option<u32>,

    /// Save scan results to a session file
    #[arg(long, value_name = "PATH")]
    pub save_session: Option<PathBuf>,

    /// Save the listing and fetched folders for offline re-runs
    #[arg(long, value_name = "PATH")]
    pub save_snapshot: Option<PathBuf>,

    /// Write the effective settings to the config file (--config or the default path)
    ///
    /// The access token is never written.
    #[arg(long)]
    pub save_config: bool,
}

/// Arguments for the load subcommand.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Session file to load
    #[arg(value_name = "SESSION_FILE")]
    pub path: PathBuf,

    /// Output format (default: text, or the configured format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl OutputFormat {
    /// Whether the format is meant for other programs rather than a terminal.
    #[must_use]
    pub fn is_machine_readable(self) -> bool {
        !matches!(self, OutputFormat::Text)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use drivedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1024B").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1_000);
        assert_eq!(parse_size("1kib").unwrap(), 1_024);
        assert_eq!(parse_size("10MB").unwrap(), 10_000_000);
        assert_eq!(parse_size("1GiB").unwrap(), 1_073_741_824);
        assert_eq!(parse_size("1TB").unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_parse_size_fractional_and_whitespace() {
        assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
        assert_eq!(parse_size("  1024  ").unwrap(), 1024);
        assert_eq!(parse_size("1 MB").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1XB").is_err());
        assert!(parse_size("-1MB").is_err());
    }

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["drivedupe", "scan"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.json_errors);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.output, None);
                assert_eq!(args.resolve, None);
                assert!(args.snapshot.is_none());
            }
            Commands::Load(_) => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_with_options() {
        let cli = Cli::try_parse_from([
            "drivedupe",
            "-v",
            "scan",
            "--token-file",
            "token.json",
            "--output",
            "json",
            "--min-size",
            "1MB",
            "--resolve",
            "duplicates",
            "--page-size",
            "200",
            "--save-session",
            "session.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.token_file, Some(PathBuf::from("token.json")));
                assert_eq!(args.output, Some(OutputFormat::Json));
                assert_eq!(args.min_size, Some(1_000_000));
                assert_eq!(args.resolve, Some(ResolveScope::Duplicates));
                assert_eq!(args.page_size, Some(200));
                assert_eq!(args.save_session, Some(PathBuf::from("session.json")));
            }
            Commands::Load(_) => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_page_size_out_of_range() {
        assert!(Cli::try_parse_from(["drivedupe", "scan", "--page-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["drivedupe", "scan", "--page-size", "1001"]).is_err());
    }

    #[test]
    fn test_cli_snapshot_conflicts_with_token_file() {
        let result = Cli::try_parse_from([
            "drivedupe",
            "scan",
            "--snapshot",
            "snap.json",
            "--token-file",
            "token.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["drivedupe", "-v", "-q", "scan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "drivedupe",
            "scan",
            "--json-errors",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert!(cli.json_errors);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_cli_invalid_subcommand() {
        assert!(Cli::try_parse_from(["drivedupe", "dedupe"]).is_err());
    }

    #[test]
    fn test_cli_parse_load_subcommand() {
        let cli = Cli::try_parse_from(["drivedupe", "load", "session.json", "--output", "csv"])
            .unwrap();
        match cli.command {
            Commands::Load(args) => {
                assert_eq!(args.path, PathBuf::from("session.json"));
                assert_eq!(args.output, Some(OutputFormat::Csv));
            }
            Commands::Scan(_) => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_cli_load_requires_path() {
        assert!(Cli::try_parse_from(["drivedupe", "load"]).is_err());
    }

    #[test]
    fn test_output_format_machine_readable() {
        assert!(!OutputFormat::Text.is_machine_readable());
        assert!(OutputFormat::Json.is_machine_readable());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
