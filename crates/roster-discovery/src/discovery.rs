//! The discovery entry point.
//!
//! [`Discovery`] bundles a [`Container`], a [`Scanner`] and the roots to scan.
//! [`initialize`](Discovery::initialize) runs the whole scan sequence once:
//! concurrent callers wait for the first one to finish, later callers return
//! immediately. Roots are scanned one after another so log output stays in a
//! stable order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use roster_core::Container;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RosterConfig;
use crate::error::{ScanError, ScanResult};
use crate::patterns::ScanPatterns;
use crate::scanner::{ScanReport, ScanStats, Scanner};

/// Process-level discovery context.
#[derive(Debug)]
pub struct Discovery {
    scanner: Scanner,
    working_dir: Option<PathBuf>,
    roots: Vec<PathBuf>,
    patterns: ScanPatterns,
    initialized: Mutex<bool>,
}

impl Discovery {
    /// Creates a discovery context with default patterns and the `src` root.
    pub fn new(container: Arc<Container>) -> Self {
        Self::with_scanner(Scanner::new(container))
    }

    /// Creates a discovery context around an existing scanner.
    pub fn with_scanner(scanner: Scanner) -> Self {
        Self {
            scanner,
            working_dir: None,
            roots: vec![PathBuf::from("src")],
            patterns: ScanPatterns::default(),
            initialized: Mutex::new(false),
        }
    }

    /// Creates a discovery context from configuration.
    pub fn from_config(container: Arc<Container>, config: &RosterConfig) -> Self {
        let discovery = &config.discovery;
        let scanner = Scanner::new(container).options(discovery.scan_options());

        Self {
            working_dir: discovery.working_dir.clone(),
            roots: discovery.roots.clone(),
            patterns: ScanPatterns::new(discovery.include.clone(), discovery.exclude.clone()),
            ..Self::with_scanner(scanner)
        }
    }

    /// Sets the directory relative roots are resolved against.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replaces the include and exclude patterns.
    pub fn patterns(mut self, patterns: ScanPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Replaces the roots scanned by [`initialize_configured`](Self::initialize_configured).
    pub fn roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn container(&self) -> &Arc<Container> {
        self.scanner.container()
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Scans the configured roots with the configured patterns.
    pub async fn initialize_configured(&self) -> ScanResult<Vec<ScanReport>> {
        self.initialize(self.roots.as_slice(), None).await
    }

    /// Scans `roots` in order, once per context.
    ///
    /// `exclude` replaces the configured exclude list for this run. A root
    /// that does not exist is logged and skipped; an invalid pattern fails the
    /// call and leaves the context uninitialized. Returns one report per
    /// scanned root, or nothing if already initialized.
    pub async fn initialize<P: AsRef<Path>>(
        &self,
        roots: &[P],
        exclude: Option<&[String]>,
    ) -> ScanResult<Vec<ScanReport>> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            debug!("Discovery already initialized");
            return Ok(Vec::new());
        }

        let patterns = match exclude {
            Some(exclude) => self.patterns.clone().with_exclude(exclude.iter().cloned()),
            None => self.patterns.clone(),
        };

        let mut reports = Vec::with_capacity(roots.len());
        for root in roots {
            let root = self.resolve_root(root.as_ref());
            match self.scanner.scan(&root, &patterns).await {
                Ok(report) => reports.push(report),
                Err(ScanError::RootNotFound { path, source }) => {
                    warn!(root = %path.display(), error = %source, "Skipping discovery root");
                }
                Err(err) => return Err(err),
            }
        }

        *initialized = true;
        info!(roots = reports.len(), stats = %self.scanner.stats(), "Discovery initialized");
        Ok(reports)
    }

    /// Returns `true` once [`initialize`](Self::initialize) has completed.
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    /// Clears the scanner caches and the initialized flag.
    ///
    /// Registered components stay in the container and a later
    /// initialization does not install them again; call
    /// [`Scanner::clear_all`] as well for full isolation.
    pub async fn reset(&self) {
        let mut initialized = self.initialized.lock().await;
        self.scanner.clear_caches();
        *initialized = false;
        debug!("Discovery reset");
    }

    pub fn stats(&self) -> ScanStats {
        self.scanner.stats()
    }

    fn resolve_root(&self, root: &Path) -> PathBuf {
        if root.is_absolute() {
            return root.to_path_buf();
        }
        match &self.working_dir {
            Some(dir) => dir.join(root),
            None => root.to_path_buf(),
        }
    }
}
