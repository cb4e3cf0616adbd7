//! Command-line interface for dirsort.
//!
//! This module handles:
//! - Argument parsing
//! - Validation of the target directory
//! - Wiring configuration, logging and the organizer together
//! - The one-shot pass and the optional watch session

use crate::config::{ConfigError, OrganizerConfig};
use crate::file_organizer::{BatchEvent, BatchReport, FileOrganizer, OrganizeError};
use crate::logging::{self, DEFAULT_LOG_FILE, LoggingError};
use crate::output::OutputFormatter;
use crate::watch::{WatchError, WatchLoop};
use clap::Parser;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Organize files in a directory into categorized subfolders.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Path to the directory you want to organize
    pub directory: PathBuf,

    /// Continuously watch and auto-organize new files
    #[arg(long)]
    pub watch: bool,

    /// Configuration file (defaults to .dirsortrc.toml or ~/.config/dirsort/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File the log is appended to
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log debug records as well
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid directory path: {}", .0.display())]
    InvalidDirectory(PathBuf),
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error("Watch mode stopped: {0}")]
    Watch(#[from] WatchError),
    #[error("Cannot install the CTRL+C handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),
}

/// Runs dirsort with parsed arguments.
///
/// Nothing is created on disk, log file included, unless the directory and
/// the configuration are valid.
pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let base_path = validate_directory(&cli.directory)?;
    let config = OrganizerConfig::load(cli.config.as_deref())?.compile()?;

    let _guard = logging::init(&cli.log_file, cli.verbose)?;
    let log_path = fs::canonicalize(&cli.log_file).unwrap_or_else(|_| cli.log_file.clone());

    let mut filters = config.filters;
    filters.exclude_path(&log_path);
    let organizer = FileOrganizer::new(base_path, config.table, filters);

    let report = organize_with_progress(&organizer)?;
    print_report(&organizer, &report, &log_path);

    if cli.watch {
        watch_directory(organizer)?;
    } else {
        OutputFormatter::success("Files have been organized successfully!");
        OutputFormatter::info(&format!("Log saved to: {}", log_path.display()));
    }

    Ok(())
}

/// Returns the canonical form of `path` if it is an existing directory.
pub fn validate_directory(path: &Path) -> Result<PathBuf, CliError> {
    if !path.is_dir() {
        return Err(CliError::InvalidDirectory(path.to_path_buf()));
    }
    fs::canonicalize(path).map_err(|_| CliError::InvalidDirectory(path.to_path_buf()))
}

fn organize_with_progress(organizer: &FileOrganizer) -> Result<BatchReport, CliError> {
    let mut progress: Option<ProgressBar> = None;

    let report = organizer.organize_once_with(|event| match event {
        BatchEvent::Scanned { total } => {
            progress = Some(OutputFormatter::create_progress_bar(total as u64));
        }
        BatchEvent::Attempted(outcome) => {
            if let Some(pb) = &progress {
                pb.set_message(outcome.category.clone());
                pb.inc(1);
            }
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(report)
}

fn print_report(organizer: &FileOrganizer, report: &BatchReport, log_path: &Path) {
    OutputFormatter::summary_table(
        organizer.table().names(),
        &report.category_counts(),
        report.moved_count(),
    );

    let failed = report.failed_count();
    if failed > 0 {
        OutputFormatter::warning(&format!(
            "{} {} could not be organized. Details are in {}",
            failed,
            if failed == 1 { "file" } else { "files" },
            log_path.display()
        ));
    }
}

fn watch_directory(organizer: FileOrganizer) -> Result<(), CliError> {
    let base_path = organizer.base_path().to_path_buf();
    let mut watch = WatchLoop::new(organizer);

    let handle = watch.handle();
    ctrlc::set_handler(move || handle.stop())?;

    OutputFormatter::info(&format!(
        "Watching for new files in: {} (Press CTRL+C to stop)",
        base_path.display()
    ));

    let report = watch.run()?;
    OutputFormatter::success(&format!(
        "Stopped watching. Organized {} new {}.",
        report.moved,
        if report.moved == 1 { "file" } else { "files" }
    ));
    if report.failed > 0 {
        OutputFormatter::warning(&format!(
            "{} new files could not be organized, see the log.",
            report.failed
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["dirsort", "/tmp/downloads"]);
        assert_eq!(cli.directory, PathBuf::from("/tmp/downloads"));
        assert!(!cli.watch);
        assert!(!cli.verbose);
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_parse_watch_and_options() {
        let cli = Cli::parse_from([
            "dirsort",
            "--watch",
            "--config",
            "rules.toml",
            "--log-file",
            "/var/log/dirsort.log",
            "-v",
            "inbox",
        ]);
        assert!(cli.watch);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(cli.log_file, PathBuf::from("/var/log/dirsort.log"));
        assert_eq!(cli.directory, PathBuf::from("inbox"));
    }

    #[test]
    fn test_directory_is_required() {
        assert!(Cli::try_parse_from(["dirsort"]).is_err());
    }

    #[test]
    fn test_validate_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let valid = validate_directory(temp_dir.path()).unwrap();
        assert_eq!(valid, fs::canonicalize(temp_dir.path()).unwrap());
        assert!(matches!(
            validate_directory(&file),
            Err(CliError::InvalidDirectory(_))
        ));
        assert!(matches!(
            validate_directory(&temp_dir.path().join("missing")),
            Err(CliError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn test_invalid_directory_has_no_side_effects() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_file = temp_dir.path().join("run.log");
        let cli = Cli {
            directory: temp_dir.path().join("missing"),
            watch: false,
            config: None,
            log_file: log_file.clone(),
            verbose: false,
        };

        let result = run_cli(cli);

        assert!(matches!(result, Err(CliError::InvalidDirectory(_))));
        assert!(!log_file.exists());
        assert!(!temp_dir.path().join("missing").exists());
    }
}
