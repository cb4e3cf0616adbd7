/// Moving files into their category folders.
///
/// [`FileOrganizer`] owns the base directory, the category table and the
/// filter rules. [`FileOrganizer::move_file`] is the single move primitive;
/// [`FileOrganizer::organize_once`] drives it over one snapshot of the base
/// directory, and the watch loop drives it per creation event.
use crate::config::CompiledFilters;
use crate::duplicate::{DuplicateError, MAX_DUPLICATE_SUFFIX, resolve_destination_with_cap};
use crate::file_category::CategoryTable;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Why a single file could not be moved. Recovered per file.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
    #[error("cannot create category folder {}: {source}", path.display())]
    CategoryDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Destination(#[from] DuplicateError),
    #[error("cannot rename to {}: {source}", to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that abort a whole organization pass.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading directory {}: {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// The result of one move attempt.
#[derive(Debug)]
pub struct MoveOutcome {
    pub source: PathBuf,
    pub category: String,
    pub result: Result<PathBuf, MoveError>,
}

impl MoveOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Final location of the file, if the move succeeded.
    pub fn destination(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }
}

/// Everything that happened during one pass over the base directory.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<MoveOutcome>,
    /// Files left in place by filter rules.
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn moved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.moved_count()
    }

    /// Number of successfully moved files per category.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for outcome in self.outcomes.iter().filter(|o| o.is_success()) {
            *counts.entry(outcome.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Progress notifications emitted during [`FileOrganizer::organize_once_with`].
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// The snapshot was taken; `total` files will be attempted.
    Scanned { total: usize },
    Attempted(&'a MoveOutcome),
}

/// Organizes the immediate files of one directory into category folders.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    base_path: PathBuf,
    table: CategoryTable,
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Creates an organizer for `base_path`. Nothing is touched on disk.
    pub fn new(base_path: impl Into<PathBuf>, table: CategoryTable, filters: CompiledFilters) -> Self {
        Self {
            base_path: base_path.into(),
            table,
            filters,
        }
    }

    /// An organizer with the built-in category table and no filters.
    pub fn with_defaults(base_path: impl Into<PathBuf>) -> Self {
        Self::new(base_path, CategoryTable::default(), CompiledFilters::default())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn filters(&self) -> &CompiledFilters {
        &self.filters
    }

    /// Folder that receives files of `category`.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.base_path.join(category)
    }

    /// Creates one folder per category. Existing folders are fine.
    pub fn ensure_category_dirs(&self) -> OrganizeResult<()> {
        for category in self.table.names() {
            let path = self.category_dir(category);
            ensure_dir(&path).map_err(|source| OrganizeError::DirectoryCreationFailed {
                path: path.clone(),
                source,
            })?;
            debug!("Ensured folder exists: {}", path.display());
        }
        Ok(())
    }

    /// Moves `file` into `destination_dir` without overwriting anything.
    ///
    /// The destination keeps the file name, disambiguated with a counter if
    /// taken. Exactly one log record is written, success or failure. Errors
    /// are returned to the caller and never panic or abort a batch.
    pub fn move_file(&self, file: &Path, destination_dir: &Path) -> Result<PathBuf, MoveError> {
        self.move_file_with_cap(file, destination_dir, MAX_DUPLICATE_SUFFIX)
    }

    fn move_file_with_cap(
        &self,
        file: &Path,
        destination_dir: &Path,
        cap: u32,
    ) -> Result<PathBuf, MoveError> {
        match Self::try_move(file, destination_dir, cap) {
            Ok(destination) => {
                info!("Moved: {} -> {}", file.display(), destination.display());
                Ok(destination)
            }
            Err(e) => {
                error!("Failed to move {}: {}", file.display(), e);
                Err(e)
            }
        }
    }

    fn try_move(file: &Path, destination_dir: &Path, cap: u32) -> Result<PathBuf, MoveError> {
        let file_name = file
            .file_name()
            .ok_or_else(|| MoveError::NoFileName(file.to_path_buf()))?;

        let destination = resolve_destination_with_cap(&destination_dir.join(file_name), cap)?;

        fs::rename(file, &destination).map_err(|source| MoveError::Rename {
            from: file.to_path_buf(),
            to: destination.clone(),
            source,
        })?;

        Ok(destination)
    }

    /// Resolves the category of `file` and moves it into that folder.
    ///
    /// The folder is recreated if it disappeared since the pass started.
    pub fn organize_file(&self, file: &Path) -> MoveOutcome {
        let category = self.table.resolve_path(file).to_string();
        let dir = self.category_dir(&category);
        let result = match ensure_dir(&dir) {
            Ok(()) => self.move_file(file, &dir),
            Err(source) => {
                let e = MoveError::CategoryDir { path: dir, source };
                error!("Failed to move {}: {}", file.display(), e);
                Err(e)
            }
        };
        MoveOutcome {
            source: file.to_path_buf(),
            category,
            result,
        }
    }

    /// Runs one organization pass over the base directory.
    pub fn organize_once(&self) -> OrganizeResult<BatchReport> {
        self.organize_once_with(|_| {})
    }

    /// Same as [`organize_once`](Self::organize_once), reporting progress to
    /// `on_event`.
    ///
    /// The directory listing is collected in full before the first move, so
    /// files landing in category folders are never revisited.
    pub fn organize_once_with<F>(&self, mut on_event: F) -> OrganizeResult<BatchReport>
    where
        F: FnMut(BatchEvent<'_>),
    {
        info!("Starting organization in: {}", self.base_path.display());
        self.ensure_category_dirs()?;

        let mut report = BatchReport::default();
        let mut candidates = Vec::new();
        for path in self.snapshot()? {
            if !is_organizable(&path) {
                continue;
            }
            if self.filters.should_include(&path) {
                candidates.push(path);
            } else {
                debug!("Skipped by filter rules: {}", path.display());
                report.skipped.push(path);
            }
        }

        on_event(BatchEvent::Scanned {
            total: candidates.len(),
        });

        for path in candidates {
            let outcome = self.organize_file(&path);
            on_event(BatchEvent::Attempted(&outcome));
            report.outcomes.push(outcome);
        }

        info!(
            moved = report.moved_count(),
            failed = report.failed_count(),
            skipped = report.skipped.len(),
            "File organization complete"
        );
        Ok(report)
    }

    fn snapshot(&self) -> OrganizeResult<Vec<PathBuf>> {
        let read_err = |source| OrganizeError::ReadDirFailed {
            path: self.base_path.clone(),
            source,
        };

        fs::read_dir(&self.base_path)
            .map_err(read_err)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(read_err)
    }
}

/// Whether a directory entry is a file to organize.
///
/// Symlinks are followed: a link to a file counts, a link to a folder or a
/// dangling link does not. Entries that vanished are not files either.
pub(crate) fn is_organizable(path: &Path) -> bool {
    path.is_file()
}

/// Creates `path` unless a directory is already there. Parents are never
/// created, so a vanished base directory is reported instead of recreated.
fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
