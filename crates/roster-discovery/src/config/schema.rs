//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::patterns::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use crate::scanner::{DEFAULT_BATCH_SIZE, ScanOptions};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RosterConfig {
    /// Discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Discovery
// =============================================================================

/// Where and how to look for component sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Base directory for relative roots. Defaults to the process working directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Directories to scan, in order.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// Glob patterns a file must match.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns that exclude a file.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Files loaded concurrently per wave.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-file load timeout in milliseconds.
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,

    /// Skip test sources regardless of the include list.
    #[serde(default = "default_true")]
    pub skip_test_sources: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            roots: default_roots(),
            include: default_include(),
            exclude: default_exclude(),
            batch_size: default_batch_size(),
            load_timeout_ms: None,
            skip_test_sources: true,
        }
    }
}

impl DiscoveryConfig {
    /// Scanner options derived from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            batch_size: self.batch_size,
            load_timeout: self.load_timeout_ms.map(Duration::from_millis),
            skip_test_sources: self.skip_test_sources,
        }
    }
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

fn default_include() -> Vec<String> {
    DEFAULT_INCLUDE.iter().map(|p| (*p).to_string()).collect()
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|p| (*p).to_string()).collect()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the corresponding `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Colored output.
    #[serde(default = "default_true")]
    pub ansi: bool,

    #[serde(default = "default_true")]
    pub timestamps: bool,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target level overrides, e.g. `roster_discovery = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            ansi: true,
            timestamps: true,
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}
