//! Ignore-rule configuration.
//!
//! This module loads the rules deciding which files are skipped during an
//! organize run. Rules come from TOML configuration files and support:
//! - Exact filename matching
//! - File extension matching
//! - Glob pattern matching
//! - Regex pattern matching
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format with the following structure:
//!
//! ```toml
//! [ignore]
//! filenames = [".DS_Store", "Thumbs.db"]
//! extensions = ["tmp", "bak"]
//! patterns = ["*.partial"]
//! regex = []
//! ```
//!
//! Without any configuration file, only the platform metadata filenames
//! (`.DS_Store`, `Thumbs.db`, `desktop.ini`) are ignored.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for which files an organize run skips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub ignore: IgnoreRules,
}

/// The ignore rules themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// Exact filenames to ignore. Omitting this field keeps the platform
    /// metadata defaults.
    #[serde(default = "default_filenames")]
    pub filenames: Vec<String>,

    /// File extensions to ignore, without the dot (e.g., "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns to ignore, matched against the whole path.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns to ignore, matched against the filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Platform metadata files ignored by default.
fn default_filenames() -> Vec<String> {
    vec![
        ".DS_Store".to_string(),
        "Thumbs.db".to_string(),
        "desktop.ini".to_string(),
    ]
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            filenames: default_filenames(),
            extensions: Vec::new(),
            patterns: Vec::new(),
            regex: Vec::new(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            ignore: IgnoreRules::default(),
        }
    }
}

impl IgnoreConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.chronosortrc.toml` in the current directory
    /// 3. Look for `~/.config/chronosort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        // If explicitly specified, load from that path
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try current directory
        let local_config = PathBuf::from(".chronosortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try home directory
        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("chronosort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        // Fall back to defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile configuration into optimized matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledIgnore, ConfigError> {
        CompiledIgnore::new(self.ignore)
    }
}

/// Compiled, optimized ignore matchers.
///
/// All patterns are parsed once up front so that per-file matching never
/// reparses a pattern.
pub struct CompiledIgnore {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledIgnore {
    /// Create compiled matchers from ignore rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    fn new(rules: IgnoreRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
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
            filenames: rules.filenames.into_iter().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Check if a file should be included in the run (not ignored).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Exact filename match - if matched, ignore
    /// 2. File extension match (case-insensitive) - if matched, ignore
    /// 3. Glob pattern match against the path - if matched, ignore
    /// 4. Regex pattern match against the filename - if matched, ignore
    /// 5. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        // 1. Check exact filename match
        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        // 2. Check extension match
        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return false;
            }
        }

        // 3. Check glob patterns
        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        // 4. Check regex patterns
        if self.regexes.iter().any(|regex| regex.is_match(&file_name)) {
            return false;
        }

        // 5. Include by default
        true
    }
}
