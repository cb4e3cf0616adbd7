/// Extension based categorization of files.
///
/// A [`CategoryTable`] is an ordered list of named categories, each owning a
/// set of lowercase extensions (leading dot included). Resolution walks the
/// table in declaration order and falls back to [`FALLBACK_CATEGORY`].
///
/// # Examples
///
/// ```
/// use dirsort::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.resolve(".JPG"), "Images");
/// assert_eq!(table.resolve(".txt"), "Documents");
/// assert_eq!(table.resolve(".xyz"), "Others");
/// assert_eq!(table.resolve(""), "Others");
/// ```
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

/// Name of the catch-all category. Always the last entry of a table.
pub const FALLBACK_CATEGORY: &str = "Others";

/// A named bucket of file extensions with a matching destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    extensions: HashSet<String>,
}

impl Category {
    /// Creates a category. Extensions are stored lowercase as given.
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// The category name, which is also its folder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `extension` (already lowercased) belongs here.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// Ordered, immutable mapping from category name to extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Builds a table from categories in declaration order.
    ///
    /// The fallback category is appended when missing, and forced to have
    /// no extensions so it can only be reached by falling through.
    pub fn new(categories: Vec<Category>) -> Self {
        let mut categories: Vec<Category> = categories
            .into_iter()
            .filter(|category| category.name != FALLBACK_CATEGORY)
            .collect();
        categories.push(Category::new(FALLBACK_CATEGORY, Vec::<String>::new()));
        Self { categories }
    }

    /// Maps an extension (with its leading dot) to a category name.
    ///
    /// Comparison is case-insensitive. Unknown extensions, and the empty
    /// extension of files without one, resolve to [`FALLBACK_CATEGORY`].
    pub fn resolve(&self, extension: &str) -> &str {
        let extension = extension.to_lowercase();
        self.categories
            .iter()
            .find(|category| category.contains(&extension))
            .map(Category::name)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Resolves the category of a path from its file name.
    pub fn resolve_path(&self, path: &Path) -> &str {
        self.resolve(&extension_of(path))
    }

    /// Category names in declaration order, fallback last.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(Category::name)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns true if `name` is one of the table's category folders.
    pub fn is_category(&self, name: &OsStr) -> bool {
        self.names().any(|category| OsStr::new(category) == name)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(vec![
            Category::new("Images", [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff"]),
            Category::new(
                "Documents",
                [".pdf", ".docx", ".doc", ".txt", ".xlsx", ".pptx", ".csv"],
            ),
            Category::new("Videos", [".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv"]),
            Category::new("Audio", [".mp3", ".wav", ".aac", ".flac", ".ogg"]),
            Category::new("Archives", [".zip", ".rar", ".tar", ".gz", ".7z"]),
            Category::new("Scripts", [".py", ".js", ".sh", ".bat", ".rb", ".php"]),
        ])
    }
}

/// Splits a file name into its stem and extension (without the dot).
///
/// The extension starts after the last `.`, but only when that dot is
/// neither the first nor the last character: `.bashrc` and `notes.` have
/// no extension, `archive.tar.gz` has `gz`.
pub fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Returns the extension of `path` including its leading dot, or an empty
/// string when the file name has none.
pub fn extension_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| split_name(name).1)
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = CategoryTable::default();
        let names: Vec<_> = table.names().collect();
        assert_eq!(
            names,
            vec![
                "Images",
                "Documents",
                "Videos",
                "Audio",
                "Archives",
                "Scripts",
                "Others"
            ]
        );
    }

    #[test]
    fn test_resolve_known_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.resolve(".jpg"), "Images");
        assert_eq!(table.resolve(".csv"), "Documents");
        assert_eq!(table.resolve(".mkv"), "Videos");
        assert_eq!(table.resolve(".flac"), "Audio");
        assert_eq!(table.resolve(".7z"), "Archives");
        assert_eq!(table.resolve(".sh"), "Scripts");
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let table = CategoryTable::default();
        for category in table.categories() {
            for ext in category.extensions() {
                assert_eq!(table.resolve(ext), table.resolve(&ext.to_uppercase()));
            }
        }
        assert_eq!(table.resolve(".Mp4"), "Videos");
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let table = CategoryTable::default();
        assert_eq!(table.resolve(".xyz"), FALLBACK_CATEGORY);
        assert_eq!(table.resolve(""), FALLBACK_CATEGORY);
        // The dot is part of the comparison.
        assert_eq!(table.resolve("jpg"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_first_declared_category_wins() {
        let table = CategoryTable::new(vec![
            Category::new("First", [".dup"]),
            Category::new("Second", [".dup"]),
        ]);
        assert_eq!(table.resolve(".dup"), "First");
    }

    #[test]
    fn test_fallback_always_last_and_empty() {
        let table = CategoryTable::new(vec![
            Category::new(FALLBACK_CATEGORY, [".weird"]),
            Category::new("Notes", [".md"]),
        ]);
        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec!["Notes", FALLBACK_CATEGORY]);
        assert_eq!(table.resolve(".weird"), FALLBACK_CATEGORY);
        assert_eq!(table.resolve(".MD"), "Notes");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("photo.JPG")), ".JPG");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("README")), "");
        assert_eq!(extension_of(Path::new(".bashrc")), "");
        assert_eq!(extension_of(Path::new("notes.")), "");
        assert_eq!(extension_of(Path::new("/some/dir/run.sh")), ".sh");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name(OsStr::new("photo.jpg")),
            (OsStr::new("photo"), Some(OsStr::new("jpg")))
        );
        assert_eq!(
            split_name(OsStr::new("backup.tar.gz")),
            (OsStr::new("backup.tar"), Some(OsStr::new("gz")))
        );
        assert_eq!(
            split_name(OsStr::new(".profile")),
            (OsStr::new(".profile"), None)
        );
        assert_eq!(split_name(OsStr::new("notes.")), (OsStr::new("notes."), None));
    }

    #[test]
    fn test_resolve_path() {
        let table = CategoryTable::default();
        assert_eq!(table.resolve_path(Path::new("/tmp/photo.JPG")), "Images");
        assert_eq!(table.resolve_path(Path::new("/tmp/Makefile")), "Others");
    }

    #[test]
    fn test_is_category() {
        let table = CategoryTable::default();
        assert!(table.is_category(OsStr::new("Images")));
        assert!(table.is_category(OsStr::new("Others")));
        assert!(!table.is_category(OsStr::new("images")));
    }
}
