//! Configuration: category table overrides and file filtering rules.
//!
//! Configuration is stored in TOML. Every section is optional:
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part", "*.crdownload"]
//! extensions = ["tmp", ".bak"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! [[categories]]
//! name = "Images"
//! extensions = [".jpg", ".png"]
//! ```
//!
//! When `categories` is present it replaces the built-in table; the
//! `Others` fallback is appended automatically.

use crate::file_category::{Category, CategoryTable, extension_of};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// Category names become folder names, so they must be a single
    /// normal path component.
    #[error("Invalid category name '{0}': must be a plain folder name")]
    InvalidCategoryName(String),
    #[error("Invalid extension '{extension}' in category '{category}'")]
    InvalidExtension { category: String, extension: String },
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level configuration as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub filters: FilterRules,

    /// Replacement category table, in declaration order.
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to organize hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides exclude rules.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Configuration ready for use: the category table and compiled filters.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub table: CategoryTable,
    pub filters: CompiledFilters,
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any discovered file is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validates the configuration and builds the category table and
    /// filter structures.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let table = if self.categories.is_empty() {
            CategoryTable::default()
        } else {
            let categories = self
                .categories
                .into_iter()
                .map(CategoryRule::into_category)
                .collect::<Result<Vec<_>, _>>()?;
            CategoryTable::new(categories)
        };

        Ok(CompiledConfig {
            table,
            filters: CompiledFilters::new(self.filters)?,
        })
    }
}

impl CategoryRule {
    fn into_category(self) -> Result<Category, ConfigError> {
        let mut components = Path::new(&self.name).components();
        let is_plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if self.name.trim().is_empty() || !is_plain {
            return Err(ConfigError::InvalidCategoryName(self.name));
        }

        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                let bare = ext.trim().trim_start_matches('.');
                if bare.is_empty() || bare.contains(['.', '/', '\\']) {
                    Err(ConfigError::InvalidExtension {
                        category: self.name.clone(),
                        extension: ext.clone(),
                    })
                } else {
                    Ok(format!(".{}", bare.to_lowercase()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Category::new(self.name, extensions))
    }
}

/// Pre-compiled filter rules.
///
/// Glob and regex patterns are parsed once so that matching a file does not
/// reparse them.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    exclude_paths: HashSet<PathBuf>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
            exclude_paths: HashSet::new(),
        })
    }

    /// Never organize the file at exactly `path`.
    pub fn exclude_path(&mut self, path: impl Into<PathBuf>) {
        self.exclude_paths.insert(path.into());
    }

    /// Check if a file should be organized.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Excluded exact paths - always left alone
    /// 2. Include patterns (whitelist) - if matched, include
    /// 3. Hidden file filter
    /// 4. Exact filename match
    /// 5. File extension match
    /// 6. Glob pattern match
    /// 7. Regex pattern match
    /// 8. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        if self.exclude_paths.contains(file_path) {
            return false;
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if matches_any(&self.include_patterns, &file_name) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        let extension = extension_of(file_path).to_lowercase();
        if !extension.is_empty() && self.exclude_extensions.contains(&extension) {
            return false;
        }

        if matches_any(&self.exclude_patterns, &file_name) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

// Only direct children are organized, so globs see the file name alone and
// never the directories above it.
fn matches_any(patterns: &[Pattern], file_name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(file_name))
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
            exclude_paths: HashSet::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
