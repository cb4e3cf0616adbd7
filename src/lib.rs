//! dirsort - sort the files of a directory into category subfolders
//!
//! Files are categorized by extension, moved without ever overwriting an
//! existing file, and optionally kept sorted by watching the directory for
//! newly created files.

pub mod cli;
pub mod config;
pub mod duplicate;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod watch;

pub use config::{CompiledConfig, CompiledFilters, ConfigError, OrganizerConfig};
pub use duplicate::resolve_destination;
pub use file_category::{Category, CategoryTable, FALLBACK_CATEGORY};
pub use file_organizer::{BatchReport, FileOrganizer, MoveError, MoveOutcome, OrganizeError};
pub use watch::{WatchError, WatchHandle, WatchLoop, WatchReport, WatchState};

pub use cli::{Cli, run_cli};
