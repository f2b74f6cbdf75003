//! Discovery error types.
//!
//! Two layers: [`LoadError`] describes why a single file could not be loaded
//! and never aborts a scan; [`ScanError`] is reserved for problems with the
//! scan request itself (bad patterns, a missing root).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roster_core::RegistryError;
use thiserror::Error;

/// Errors that stop a scan before any file is loaded.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root directory does not exist or cannot be resolved.
    #[error("Discovery root not found: {path}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An include or exclude pattern is not a valid glob.
    #[error("Invalid discovery pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// The blocking directory walk did not complete.
    #[error("Directory enumeration failed for {path}: {reason}")]
    Enumerate { path: PathBuf, reason: String },
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Why a single candidate file failed to load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read or resolved.
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No component registered by this binary was declared in the file.
    #[error("No linked components are declared in {0}")]
    NotLinked(PathBuf),

    /// A component declared in the file failed to install.
    #[error("Failed to install component `{type_name}` from {path}: {source}")]
    Install {
        path: PathBuf,
        type_name: String,
        #[source]
        source: RegistryError,
    },

    /// The load did not finish within the configured timeout.
    #[error("Loading {path} timed out after {after:?}")]
    TimedOut { path: PathBuf, after: Duration },
}

impl LoadError {
    /// Returns the file this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Install { path, .. }
            | Self::TimedOut { path, .. }
            | Self::NotLinked(path) => path,
        }
    }

    /// Returns `true` for failures that are routine during discovery.
    ///
    /// Expected failures are logged at debug level; everything else is a
    /// warning. Neither stops the scan.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::NotLinked(_) => true,
            Self::Io { source, .. } if source.kind() == ErrorKind::NotFound => true,
            _ => is_test_fixture(self.path()),
        }
    }
}

/// Test sources and fixtures routinely fail to load outside their harness.
///
/// Demo and example directories hold real components and are not included.
fn is_test_fixture(path: &Path) -> bool {
    let in_fixture_dir = path
        .components()
        .any(|component| matches!(component.as_os_str().to_str(), Some("tests" | "fixtures")));

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let test_file = file_name.ends_with("_test.rs")
        || file_name.ends_with("_tests.rs")
        || file_name.contains(".test.")
        || file_name.contains(".spec.");

    in_fixture_dir || test_file
}
