use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::source::FingerprintMode;

const CONFIG_DIR: &str = ".symdex";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// File extensions to index
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Patterns to ignore (in addition to .gitignore and .symdexignore)
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Change detection: "metadata" (size + mtime) or "content" (size + hash)
    #[serde(default)]
    pub fingerprint: FingerprintMode,

    /// Number of parallel extraction threads (None = auto-detect)
    #[serde(default)]
    pub parallel_threads: Option<usize>,

    /// Extracted files buffered between the workers and the index writer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,

    /// Index hidden files and directories
    #[serde(default)]
    pub include_hidden: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: default_ignore_patterns(),
            fingerprint: FingerprintMode::default(),
            parallel_threads: None,
            channel_capacity: default_channel_capacity(),
            follow_links: false,
            include_hidden: false,
        }
    }
}

impl IndexerConfig {
    /// Worker count for the extraction pool.
    pub fn worker_threads(&self) -> usize {
        self.parallel_threads
            .filter(|&threads| threads > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

fn default_extensions() -> Vec<String> {
    ["py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "rs"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        "target".to_string(),
        ".git".to_string(),
        "dist".to_string(),
        "build".to_string(),
        "__pycache__".to_string(),
        ".venv".to_string(),
        "venv".to_string(),
    ]
}

fn default_channel_capacity() -> usize {
    64
}

/// Substring search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether substring matching is case-sensitive
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Maximum number of substring matches returned (0 = unlimited)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: default_case_sensitive(),
            max_results: default_max_results(),
        }
    }
}

fn default_case_sensitive() -> bool {
    true
}

fn default_max_results() -> usize {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Index snapshot file (relative to .symdex/)
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_file: default_snapshot_file(),
        }
    }
}

fn default_snapshot_file() -> String {
    "index.json".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rolling files
    #[serde(default)]
    pub enabled: bool,

    /// Write logs to stderr
    #[serde(default = "default_stderr")]
    pub stderr: bool,

    /// Level for the file layer: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (relative paths resolve against the project root)
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Rotation: daily, hourly, minutely, never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// File name prefix for rolled log files
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: default_stderr(),
            level: default_log_level(),
            directory: default_log_directory(),
            rotation: default_rotation(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_stderr() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("logs")
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_file_prefix() -> String {
    "symdex.log".to_string()
}

impl Config {
    /// Load configuration from the .symdex directory
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the .symdex directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the .symdex directory
    pub fn symdex_dir(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR)
    }

    /// Get the path to the persisted index snapshot
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        Self::symdex_dir(root).join(&self.storage.snapshot_file)
    }

    /// Check if symdex is initialized in the given directory
    pub fn is_initialized(root: &Path) -> bool {
        Self::symdex_dir(root).exists()
    }
}
