//! Collision-free destination paths.
//!
//! When a destination is already taken, a counter in parentheses is inserted
//! before the extension: `photo.jpg`, `photo(1).jpg`, `photo(2).jpg`, ...

use crate::file_category::split_name;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest counter tried before giving up on a destination.
pub const MAX_DUPLICATE_SUFFIX: u32 = 10_000;

#[derive(Debug, Error)]
pub enum DuplicateError {
    /// The existence check itself failed (e.g. unreadable parent).
    #[error("cannot check whether {} exists: {source}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Every counter up to [`MAX_DUPLICATE_SUFFIX`] is taken.
    #[error("no free name for {} after {attempts} attempts", path.display())]
    Exhausted { path: PathBuf, attempts: u32 },
    /// The taken candidate has no file name to number.
    #[error("cannot number {}: path has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// Returns `candidate` if nothing exists there, otherwise the first
/// `stem(N)ext` sibling that does not exist, for the smallest `N >= 1`.
///
/// Existence is re-checked for every counter, so gaps left by deleted
/// duplicates are reused. The answer is only valid at call time.
///
/// # Examples
///
/// ```
/// use dirsort::duplicate::resolve_destination;
/// use std::path::Path;
///
/// let free = resolve_destination(Path::new("/definitely/not/here.txt")).unwrap();
/// assert_eq!(free, Path::new("/definitely/not/here.txt"));
/// ```
pub fn resolve_destination(candidate: &Path) -> Result<PathBuf, DuplicateError> {
    resolve_destination_with_cap(candidate, MAX_DUPLICATE_SUFFIX)
}

/// [`resolve_destination`] trying counters up to `cap` only.
pub(crate) fn resolve_destination_with_cap(
    candidate: &Path,
    cap: u32,
) -> Result<PathBuf, DuplicateError> {
    if !exists(candidate)? {
        return Ok(candidate.to_path_buf());
    }

    let Some(name) = candidate.file_name() else {
        return Err(DuplicateError::NoFileName(candidate.to_path_buf()));
    };
    let (stem, extension) = split_name(name);

    for counter in 1..=cap {
        let mut numbered = OsString::from(stem);
        numbered.push(format!("({counter})"));
        if let Some(ext) = extension {
            numbered.push(".");
            numbered.push(ext);
        }

        let next = candidate.with_file_name(numbered);
        if !exists(&next)? {
            return Ok(next);
        }
    }

    Err(DuplicateError::Exhausted {
        path: candidate.to_path_buf(),
        attempts: cap,
    })
}

fn exists(path: &Path) -> Result<bool, DuplicateError> {
    // Dangling symlinks still occupy the name.
    if path.symlink_metadata().is_ok() {
        return Ok(true);
    }
    path.try_exists().map_err(|source| DuplicateError::Probe {
        path: path.to_path_buf(),
        source,
    })
}
