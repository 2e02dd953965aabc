//! drivedupe - duplicate file finder for cloud drives
//!
//! Lists every file in a Google Drive, groups files whose content hash
//! matches, and reports each duplicate with the folder path it lives in.
//!
//! The pipeline is:
//!
//! 1. [`source::FileSource::list_all_files`] fetches the listing
//! 2. [`duplicates::group_duplicates`] groups records by content hash
//! 3. [`resolver::PathResolver`] walks parent chains into folder paths,
//!    fetching each folder at most once
//! 4. [`output`] renders the groups as text, JSON or CSV
//!
//! [`duplicates::DuplicateFinder`] runs steps 1 to 3 against any
//! [`source::FileSource`], so everything except the Drive client itself can
//! be exercised with [`source::MemorySource`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod resolver;
pub mod session;
pub mod signal;
pub mod source;

use std::fs::File;
use std::io::{BufWriter, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands, LoadArgs, OutputFormat, ScanArgs};
use config::Config;
use duplicates::{unresolved_members, DuplicateFinder, ResolveScope};
use error::ExitCode;
use output::Report;
use progress::{Progress, ProgressCallback};
use session::{Session, SessionSettings};
use source::{DriveSource, FileSource, Snapshot};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Fatal failures (bad config, missing token, listing failure, interrupt,
/// I/O on output files) come back as errors; use
/// [`ExitCode::from_error`] to map them to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        no_color,
        config: config_path,
        command,
        ..
    } = cli;

    logging::init_logging(verbose, quiet);
    if no_color {
        yansi::disable();
    }

    let config = Config::load(config_path.as_deref())?;

    match command {
        Commands::Scan(args) => run_scan(config, config_path.as_deref(), &args, quiet, no_color),
        Commands::Load(args) => run_load(&config, &args, no_color),
    }
}

fn run_scan(
    mut config: Config,
    config_path: Option<&Path>,
    args: &ScanArgs,
    quiet: bool,
    no_color: bool,
) -> Result<ExitCode> {
    config.apply_scan_args(args)?;
    let format = config.scan.output;

    if args.save_config {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path()
                .context("Could not determine the configuration directory")?,
        };
        config.save(&path)?;
        log::info!("Saved configuration to {}", path.display());
    }

    let handler = signal::install_handler()?;
    let shutdown_flag = handler.get_flag();

    let show_progress =
        !quiet && !(format.is_machine_readable() && args.output_file.is_none());
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(shutdown_flag.clone())
        .with_progress_callback(progress.clone());

    let (source, source_label): (Box<dyn FileSource>, String) = match args.snapshot {
        Some(ref path) => {
            let snapshot = Snapshot::load(path)?;
            if snapshot.resolve == ResolveScope::Duplicates
                && finder_config.resolve_scope == ResolveScope::All
            {
                log::warn!(
                    "Snapshot {} only holds folders of duplicate files; resolving duplicates only",
                    path.display()
                );
                finder_config = finder_config.with_resolve_scope(ResolveScope::Duplicates);
            }
            log::info!(
                "Scanning snapshot {} ({} files, {} folders)",
                path.display(),
                snapshot.files.len(),
                snapshot.folders.len()
            );
            (
                Box::new(snapshot.into_source()),
                format!("snapshot:{}", path.display()),
            )
        }
        None => {
            let token = resolve_access_token(&config)?;
            let drive = DriveSource::new(config.drive_config(token))
                .context("Failed to create Drive client")?
                .with_shutdown_flag(shutdown_flag)
                .with_progress_callback(progress);
            (Box::new(drive), config.drive.api_base_url.clone())
        }
    };

    let report = DuplicateFinder::new(&*source, finder_config.clone()).find_duplicates()?;

    if let Some(ref path) = args.save_snapshot {
        Snapshot::new(report.files.clone(), report.folders.clone())
            .with_resolve_scope(finder_config.resolve_scope)
            .save(path)?;
    }
    if let Some(ref path) = args.save_session {
        Session::from_report(&report, source_label, SessionSettings::from(&finder_config))
            .save(path)?;
    }

    let exit_code =
        ExitCode::from_outcome(report.summary.duplicate_groups, report.summary.unresolved_duplicates);
    let view = Report {
        groups: &report.groups,
        paths: &report.paths,
        summary: &report.summary,
        exit_code,
    };
    emit(&view, format, no_color, args.output_file.as_deref())?;

    Ok(exit_code)
}

fn run_load(config: &Config, args: &LoadArgs, no_color: bool) -> Result<ExitCode> {
    let session = Session::load(&args.path)?;
    let (groups, paths) = session.to_results();
    let format = args.output.unwrap_or(config.scan.output);

    log::info!(
        "Loaded session from {} ({} groups, {} files)",
        session.source,
        groups.len(),
        session.file_count()
    );

    let exit_code = ExitCode::from_outcome(groups.len(), unresolved_members(&groups, &paths));
    let view = Report {
        groups: &groups,
        paths: &paths,
        summary: &session.summary,
        exit_code,
    };
    emit(&view, format, no_color, args.output_file.as_deref())?;

    Ok(exit_code)
}

/// Explicit token first, then the token file.
fn resolve_access_token(config: &Config) -> Result<String> {
    if let Some(token) = config.drive.access_token.as_deref().map(str::trim) {
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    if let Some(ref path) = config.drive.token_file {
        return source::drive::load_access_token(path);
    }
    anyhow::bail!(
        "No access token: pass --access-token, set DRIVEDUPE_ACCESS_TOKEN or use --token-file"
    )
}

fn emit(report: &Report<'_>, format: OutputFormat, no_color: bool, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            report.write(format, false, &mut writer)?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let color = !no_color && stdout.is_terminal();
            let mut lock = stdout.lock();
            report.write(format, color, &mut lock)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_access_token_prefers_explicit() {
        let mut config = Config::default();
        config.drive.access_token = Some(" tok ".into());
        config.drive.token_file = Some("missing.json".into());
        assert_eq!(resolve_access_token(&config).unwrap(), "tok");
    }

    #[test]
    fn test_resolve_access_token_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"access_token": "abc", "token_type": "Bearer"}"#).unwrap();

        let mut config = Config::default();
        config.drive.access_token = Some(String::new());
        config.drive.token_file = Some(path);
        assert_eq!(resolve_access_token(&config).unwrap(), "abc");
    }

    #[test]
    fn test_resolve_access_token_missing() {
        let err = resolve_access_token(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No access token"));
    }
}
