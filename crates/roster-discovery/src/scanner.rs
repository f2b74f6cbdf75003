//! File-system scanner.
//!
//! The scanner enumerates candidate files below a root, then loads them in
//! bounded concurrent waves through a [`ModuleLoader`]. It keeps two caches:
//!
//! - **roots**: each canonical root is scanned at most once; the root is
//!   marked as scanning *before* enumeration so an overlapping request for
//!   the same root returns immediately
//! - **modules**: each canonical file path is loaded at most once; the path
//!   is reserved before the load starts, so concurrent requests for the same
//!   file never load it twice
//!
//! A failed load releases its reservation, so a later scan retries the file.
//! Reservations are also released when a scan or load future is dropped
//! before it completes.
//! Failures are logged (debug for expected ones, warn otherwise) and counted
//! in the [`ScanReport`]; they never fail a scan.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use roster_core::Container;
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::error::{LoadError, ScanError, ScanResult};
use crate::loader::{LinkedModuleLoader, LoadedModule, ModuleLoader};
use crate::patterns::{CompiledPatterns, ScanPatterns};

/// Default number of files loaded concurrently per wave.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Tunables for a [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Files loaded concurrently per wave. Zero is treated as one.
    pub batch_size: usize,

    /// Upper bound on a single file load.
    pub load_timeout: Option<Duration>,

    /// Skip test sources regardless of the include list.
    pub skip_test_sources: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            load_timeout: None,
            skip_test_sources: true,
        }
    }
}

/// Scan progress of a root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootState {
    Unscanned,
    Scanning,
    Scanned,
}

/// What happened to one file passed to [`Scanner::load`].
#[derive(Debug)]
pub enum LoadOutcome {
    /// The loader ran and installed components.
    Loaded(LoadedModule),
    /// The file was already loaded or is being loaded.
    Cached,
    /// The load failed.
    Failed(LoadError),
}

/// Summary of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Canonical root, when the report comes from a directory scan.
    pub root: Option<PathBuf>,

    /// `true` if the root had already been scanned and nothing was done.
    pub already_scanned: bool,

    /// Candidate files after include/exclude filtering.
    pub discovered: usize,

    /// Files loaded during this scan.
    pub loaded: usize,

    /// Files skipped because they were already loaded or in flight.
    pub skipped_cached: usize,

    /// Files whose load failed in an expected way.
    pub expected_failures: usize,

    /// Files whose load failed unexpectedly.
    pub failures: Vec<PathBuf>,

    /// Components installed during this scan.
    pub components: usize,
}

impl ScanReport {
    fn for_root(root: &Path) -> Self {
        Self {
            root: Some(root.to_path_buf()),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(module) => {
                self.loaded += 1;
                self.components += module.components.len();
            }
            LoadOutcome::Cached => self.skipped_cached += 1,
            LoadOutcome::Failed(err) if err.is_expected() => self.expected_failures += 1,
            LoadOutcome::Failed(err) => self.failures.push(err.path().to_path_buf()),
        }
    }
}

/// Snapshot of the scanner caches and the container they feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub scanned_roots: usize,
    pub groups: usize,
    pub total_keys: usize,
    pub cached_modules: usize,
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Roots: {}, Groups: {}, Keys: {}, Modules: {}",
            self.scanned_roots, self.groups, self.total_keys, self.cached_modules
        )
    }
}

#[derive(Default)]
struct ScanState {
    roots: HashMap<PathBuf, RootState>,
    loaded: HashMap<PathBuf, LoadedModule>,
    in_flight: HashSet<PathBuf>,
}

#[derive(Clone, Copy)]
enum ReservationKind {
    Root,
    Module,
}

/// Undoes a root or module reservation unless disarmed.
struct Reservation<'a> {
    state: &'a Mutex<ScanState>,
    path: PathBuf,
    kind: ReservationKind,
    armed: bool,
}

impl<'a> Reservation<'a> {
    fn new(state: &'a Mutex<ScanState>, path: PathBuf, kind: ReservationKind) -> Self {
        Self {
            state,
            path,
            kind,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        match self.kind {
            ReservationKind::Root => {
                if state.roots.get(&self.path) == Some(&RootState::Scanning) {
                    state.roots.remove(&self.path);
                }
            }
            ReservationKind::Module => {
                state.in_flight.remove(&self.path);
            }
        }
    }
}

/// Discovers and loads component source files.
pub struct Scanner {
    container: Arc<Container>,
    loader: Arc<dyn ModuleLoader>,
    options: ScanOptions,
    state: Mutex<ScanState>,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("options", &self.options)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Creates a scanner that installs linked `#[component]` registrations.
    pub fn new(container: Arc<Container>) -> Self {
        Self::with_loader(container, Arc::new(LinkedModuleLoader::new()))
    }

    /// Creates a scanner with a custom module loader.
    pub fn with_loader(container: Arc<Container>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            container,
            loader,
            options: ScanOptions::default(),
            state: Mutex::new(ScanState::default()),
        }
    }

    /// Replaces the scan options.
    pub fn options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the active scan options.
    pub fn scan_options(&self) -> &ScanOptions {
        &self.options
    }

    /// Returns the container components are installed into.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Scans `root` with the default include and exclude patterns.
    pub async fn scan_default(&self, root: impl AsRef<Path>) -> ScanResult<ScanReport> {
        self.scan(root, &ScanPatterns::default()).await
    }

    /// Scans `root` once, loading every candidate file.
    ///
    /// Returns immediately with `already_scanned` set if the root is being
    /// or has been scanned.
    pub async fn scan(&self, root: impl AsRef<Path>, patterns: &ScanPatterns) -> ScanResult<ScanReport> {
        let requested = root.as_ref();
        let compiled = patterns.compile(self.options.skip_test_sources)?;
        let root = tokio::fs::canonicalize(requested)
            .await
            .map_err(|source| ScanError::RootNotFound {
                path: requested.to_path_buf(),
                source,
            })?;

        {
            let mut state = self.state.lock();
            let current = state.roots.get(&root).copied().unwrap_or(RootState::Unscanned);
            if current != RootState::Unscanned {
                debug!(root = %root.display(), state = ?current, "Root already scanned");
                return Ok(ScanReport {
                    already_scanned: true,
                    ..ScanReport::for_root(&root)
                });
            }
            state.roots.insert(root.clone(), RootState::Scanning);
        }
        let reservation = Reservation::new(&self.state, root.clone(), ReservationKind::Root);

        debug!(root = %root.display(), "Scanning for components");

        let files = enumerate(root.clone(), compiled).await?;

        let mut report = ScanReport::for_root(&root);
        report.discovered = files.len();
        self.load_waves(&files, &mut report).await;

        self.state.lock().roots.insert(root.clone(), RootState::Scanned);
        reservation.disarm();

        info!(
            root = %root.display(),
            discovered = report.discovered,
            loaded = report.loaded,
            components = report.components,
            failures = report.failures.len(),
            "Scan complete"
        );
        Ok(report)
    }

    /// Loads an explicit list of files without enumeration.
    pub async fn scan_files<I, P>(&self, files: I) -> ScanReport
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files: Vec<PathBuf> = files.into_iter().map(Into::into).collect();
        let mut report = ScanReport {
            discovered: files.len(),
            ..ScanReport::default()
        };
        self.load_waves(&files, &mut report).await;
        report
    }

    async fn load_waves(&self, files: &[PathBuf], report: &mut ScanReport) {
        let batch_size = self.options.batch_size.max(1);
        for (wave, chunk) in files.chunks(batch_size).enumerate() {
            trace!(wave, size = chunk.len(), "Loading wave");
            let outcomes = join_all(chunk.iter().map(|path| self.load(path))).await;
            for outcome in outcomes {
                report.record(outcome);
            }
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads one file unless it is already loaded or being loaded.
    pub async fn load(&self, path: impl AsRef<Path>) -> LoadOutcome {
        let requested = path.as_ref();
        let path = match tokio::fs::canonicalize(requested).await {
            Ok(path) => path,
            Err(source) => {
                let err = LoadError::Io {
                    path: requested.to_path_buf(),
                    source,
                };
                log_failure(&err);
                return LoadOutcome::Failed(err);
            }
        };

        {
            let mut state = self.state.lock();
            if state.loaded.contains_key(&path) || !state.in_flight.insert(path.clone()) {
                trace!(path = %path.display(), "Module already loaded");
                return LoadOutcome::Cached;
            }
        }
        let reservation = Reservation::new(&self.state, path.clone(), ReservationKind::Module);

        let load = self.loader.load(&path, &self.container);
        let result = match self.options.load_timeout {
            Some(after) => tokio::time::timeout(after, load)
                .await
                .unwrap_or_else(|_| Err(LoadError::TimedOut { path: path.clone(), after })),
            None => load.await,
        };

        let mut state = self.state.lock();
        state.in_flight.remove(&path);
        reservation.disarm();
        match result {
            Ok(module) => {
                state.loaded.insert(path, module.clone());
                LoadOutcome::Loaded(module)
            }
            Err(err) => {
                drop(state);
                log_failure(&err);
                LoadOutcome::Failed(err)
            }
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns the scan state of `root`.
    ///
    /// The path is compared as given; pass the canonical path for roots that
    /// were scanned through a relative or symlinked path.
    pub fn root_state(&self, root: impl AsRef<Path>) -> RootState {
        self.state
            .lock()
            .roots
            .get(root.as_ref())
            .copied()
            .unwrap_or(RootState::Unscanned)
    }

    /// Returns `true` if the canonical file path was loaded successfully.
    pub fn is_loaded(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().loaded.contains_key(path.as_ref())
    }

    /// Returns the successfully loaded modules, sorted by path.
    pub fn loaded_modules(&self) -> Vec<LoadedModule> {
        let mut modules: Vec<_> = self.state.lock().loaded.values().cloned().collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }

    /// Returns cache and container statistics.
    pub fn stats(&self) -> ScanStats {
        let (scanned_roots, cached_modules) = {
            let state = self.state.lock();
            let scanned = state.roots.values().filter(|s| **s == RootState::Scanned).count();
            (scanned, state.loaded.len())
        };
        ScanStats {
            scanned_roots,
            groups: self.container.registry_names().len(),
            total_keys: self.container.total_keys(),
            cached_modules,
        }
    }

    /// Forgets scanned roots, loaded modules and pending reservations.
    ///
    /// Components already installed stay in the container and are not
    /// installed again by a rescan.
    pub fn clear_caches(&self) {
        let mut state = self.state.lock();
        state.roots.clear();
        state.loaded.clear();
        state.in_flight.clear();
        debug!("Scanner caches cleared");
    }

    /// Clears the caches and the container, so a rescan installs every
    /// component afresh.
    pub fn clear_all(&self) {
        self.clear_caches();
        self.container.clear_all();
        self.loader.forget_installed();
    }
}

fn log_failure(err: &LoadError) {
    if err.is_expected() {
        debug!(path = %err.path().display(), error = %err, "Skipped module");
    } else {
        warn!(path = %err.path().display(), error = %err, "Failed to load module");
    }
}

/// Walks `root` on the blocking pool and returns matching files in a stable order.
async fn enumerate(root: PathBuf, patterns: CompiledPatterns) -> ScanResult<Vec<PathBuf>> {
    let walk_root = root.clone();
    tokio::task::spawn_blocking(move || walk(&walk_root, &patterns))
        .await
        .map_err(|e| ScanError::Enumerate {
            path: root,
            reason: e.to_string(),
        })
}

fn walk(root: &Path, patterns: &CompiledPatterns) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if patterns.is_candidate(&relative) {
            files.push(entry.into_path());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::loader::testing::{BROKEN, PAYPAL, Processor, STRIPE};

    /// Records every path it is asked to load.
    #[derive(Default)]
    struct RecordingLoader {
        seen: Mutex<Vec<PathBuf>>,
        fail_on: Option<&'static str>,
        delay: Option<Duration>,
    }

    impl RecordingLoader {
        fn file_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .seen
                .lock()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[async_trait]
    impl ModuleLoader for RecordingLoader {
        async fn load(&self, path: &Path, _container: &Container) -> Result<LoadedModule, LoadError> {
            self.seen.lock().push(path.to_path_buf());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on.is_some_and(|name| path.ends_with(name)) {
                return Err(LoadError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            Ok(LoadedModule::new(path))
        }
    }

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn scanner(loader: Arc<RecordingLoader>) -> Scanner {
        Scanner::with_loader(Arc::new(Container::new()), loader)
    }

    #[tokio::test]
    async fn test_declaration_and_test_files_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Foo.ts");
        touch(dir.path(), "Foo.d.ts");
        touch(dir.path(), "Foo.test.ts");
        let loader = Arc::new(RecordingLoader::default());
        let scanner = scanner(loader.clone());

        let report = scanner
            .scan(dir.path(), &ScanPatterns::new(["**/*.ts"], ["**/*.d.ts"]))
            .await
            .unwrap();

        assert_eq!(loader.file_names(), vec!["Foo.ts"]);
        assert_eq!(report.discovered, 1);
        assert_eq!(report.loaded, 1);
    }

    #[tokio::test]
    async fn test_default_patterns_skip_build_output() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/lib.rs");
        touch(dir.path(), "src/processors/stripe.rs");
        touch(dir.path(), "target/debug/out.rs");
        touch(dir.path(), "build.rs");
        touch(dir.path(), "tests/it.rs");
        touch(dir.path(), "README.md");
        let loader = Arc::new(RecordingLoader::default());
        let scanner = scanner(loader.clone());

        scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(loader.file_names(), vec!["lib.rs", "stripe.rs"]);
    }

    #[tokio::test]
    async fn test_root_scanned_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/a.rs");
        let loader = Arc::new(RecordingLoader::default());
        let scanner = scanner(loader.clone());

        let first = scanner.scan_default(dir.path()).await.unwrap();
        let second = scanner.scan_default(dir.path()).await.unwrap();

        assert!(!first.already_scanned);
        assert!(second.already_scanned);
        assert_eq!(loader.seen.lock().len(), 1);

        let root = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(scanner.root_state(&root), RootState::Scanned);
    }

    #[tokio::test]
    async fn test_concurrent_scans_of_same_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs");
        touch(dir.path(), "b.rs");
        let loader = Arc::new(RecordingLoader {
            delay: Some(Duration::from_millis(20)),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader.clone());

        let (first, second) = tokio::join!(scanner.scan_default(dir.path()), scanner.scan_default(dir.path()));

        let reports = [first.unwrap(), second.unwrap()];
        assert_eq!(reports.iter().filter(|r| r.already_scanned).count(), 1);
        assert_eq!(loader.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_roots_load_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/processors/stripe.rs");
        touch(dir.path(), "src/lib.rs");
        let loader = Arc::new(RecordingLoader::default());
        let scanner = scanner(loader.clone());

        scanner.scan_default(dir.path().join("src/processors")).await.unwrap();
        let report = scanner.scan_default(dir.path().join("src")).await.unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped_cached, 1);
        assert_eq!(loader.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_of_same_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "stripe.rs");
        let loader = Arc::new(RecordingLoader {
            delay: Some(Duration::from_millis(20)),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader.clone());
        let path = dir.path().join("stripe.rs");

        let (a, b) = tokio::join!(scanner.load(&path), scanner.load(&path));

        let loaded = [a, b].into_iter().filter(|o| matches!(o, LoadOutcome::Loaded(_))).count();
        assert_eq!(loaded, 1);
        assert_eq!(loader.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_scan() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs");
        touch(dir.path(), "b.rs");
        touch(dir.path(), "c.rs");
        let loader = Arc::new(RecordingLoader {
            fail_on: Some("b.rs"),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader.clone());

        let report = scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].ends_with("b.rs"));
        assert!(!scanner.is_loaded(&report.failures[0]));

        // Failed files are retried; loaded ones are not.
        let retry = scanner
            .scan_files([dir.path().join("a.rs"), dir.path().join("b.rs")])
            .await;
        assert_eq!(retry.skipped_cached, 1);
        assert_eq!(retry.failures.len(), 1);
        assert_eq!(loader.seen.lock().len(), 4);
    }

    #[tokio::test]
    async fn test_waves_bound_concurrency() {
        struct Gauge {
            active: AtomicUsize,
            peak: AtomicUsize,
        }

        #[async_trait]
        impl ModuleLoader for Gauge {
            async fn load(&self, path: &Path, _container: &Container) -> Result<LoadedModule, LoadError> {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                self.active.fetch_sub(1, Ordering::SeqCst);
                Ok(LoadedModule::new(path))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            touch(dir.path(), &format!("m{i}.rs"));
        }
        let gauge = Arc::new(Gauge {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let scanner = Scanner::with_loader(Arc::new(Container::new()), gauge.clone()).options(ScanOptions {
            batch_size: 3,
            ..ScanOptions::default()
        });

        let report = scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(report.loaded, 7);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_load_timeout() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "slow.rs");
        let loader = Arc::new(RecordingLoader {
            delay: Some(Duration::from_millis(200)),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader).options(ScanOptions {
            load_timeout: Some(Duration::from_millis(10)),
            ..ScanOptions::default()
        });

        let outcome = scanner.load(dir.path().join("slow.rs")).await;

        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::TimedOut { .. })));
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner(Arc::new(RecordingLoader::default()));

        let err = scanner.scan_default(dir.path().join("absent")).await.unwrap_err();

        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_pattern_leaves_root_unscanned() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner(Arc::new(RecordingLoader::default()));

        let err = scanner
            .scan(dir.path(), &ScanPatterns::new(["src/{a"], Vec::<String>::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Pattern { .. }));
        assert_eq!(scanner.stats().scanned_roots, 0);
    }

    #[tokio::test]
    async fn test_clear_caches_allows_rescan() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs");
        let loader = Arc::new(RecordingLoader::default());
        let scanner = scanner(loader.clone());

        scanner.scan_default(dir.path()).await.unwrap();
        scanner.clear_caches();
        let report = scanner.scan_default(dir.path()).await.unwrap();

        assert!(!report.already_scanned);
        assert_eq!(loader.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_linked_loader_populates_container() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/processors/stripe.rs");
        touch(dir.path(), "src/processors/paypal.rs");
        touch(dir.path(), "src/lib.rs");
        let container = Arc::new(Container::new());
        let scanner = Scanner::with_loader(
            container.clone(),
            Arc::new(LinkedModuleLoader::from_registrations([&STRIPE, &PAYPAL])),
        );

        let report = scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.expected_failures, 1);
        assert_eq!(report.components, 2);
        let mut keys = container.keys_for::<dyn Processor>();
        keys.sort();
        assert_eq!(keys, vec!["paypal".to_string(), "stripe".to_string()]);

        let stats = scanner.stats();
        assert_eq!(stats.cached_modules, 2);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.to_string(), "Roots: 1, Groups: 1, Keys: 2, Modules: 2");
    }

    #[tokio::test]
    async fn test_partial_failure_retry_keeps_one_entry_per_sibling() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/processors/paypal.rs");
        let container = Arc::new(Container::new());
        let scanner = Scanner::with_loader(
            container.clone(),
            Arc::new(LinkedModuleLoader::from_registrations([&BROKEN, &PAYPAL])),
        );
        let file = dir.path().join("src/processors/paypal.rs");

        let first = scanner.scan_files([file.clone()]).await;
        let second = scanner.scan_files([file]).await;

        assert_eq!(first.failures.len(), 1);
        assert_eq!(second.failures.len(), 1);
        let registry = container.registry::<dyn Processor>("Processor").unwrap();
        assert_eq!(registry.entry_count(&"paypal".to_string()), 1);
        assert_eq!(container.get_all_collections_for::<dyn Processor>().unwrap()["paypal"].len(), 1);
    }

    #[tokio::test]
    async fn test_stats_count_only_finished_roots() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs");
        let root = dir.path().canonicalize().unwrap();
        let loader = Arc::new(RecordingLoader {
            delay: Some(Duration::from_millis(100)),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader);

        let (report, (state, during)) = tokio::join!(scanner.scan_default(&root), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            (scanner.root_state(&root), scanner.stats())
        });

        report.unwrap();
        assert_eq!(state, RootState::Scanning);
        assert_eq!(during.scanned_roots, 0);
        assert_eq!(scanner.stats().scanned_roots, 1);
    }

    #[tokio::test]
    async fn test_dropped_scan_releases_reservations() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs");
        let root = dir.path().canonicalize().unwrap();
        let loader = Arc::new(RecordingLoader {
            delay: Some(Duration::from_millis(500)),
            ..RecordingLoader::default()
        });
        let scanner = scanner(loader.clone());

        let dropped = tokio::time::timeout(Duration::from_millis(100), scanner.scan_default(&root)).await;
        assert!(dropped.is_err());
        assert_eq!(scanner.root_state(&root), RootState::Unscanned);

        let outcome = scanner.load(root.join("a.rs")).await;
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        assert_eq!(loader.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_caches_keeps_installed_components_single() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/processors/stripe.rs");
        let container = Arc::new(Container::new());
        let scanner = Scanner::with_loader(
            container.clone(),
            Arc::new(LinkedModuleLoader::from_registrations([&STRIPE])),
        );

        scanner.scan_default(dir.path()).await.unwrap();
        scanner.clear_caches();
        let rescan = scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(rescan.loaded, 1);
        assert_eq!(rescan.components, 0);
        let registry = container.registry::<dyn Processor>("Processor").unwrap();
        assert_eq!(registry.entry_count(&"stripe".to_string()), 1);
    }

    #[tokio::test]
    async fn test_clear_all_reinstalls_components() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/processors/stripe.rs");
        let container = Arc::new(Container::new());
        let scanner = Scanner::with_loader(
            container.clone(),
            Arc::new(LinkedModuleLoader::from_registrations([&STRIPE])),
        );

        scanner.scan_default(dir.path()).await.unwrap();
        scanner.clear_all();
        assert_eq!(container.total_keys(), 0);
        let rescan = scanner.scan_default(dir.path()).await.unwrap();

        assert_eq!(rescan.components, 1);
        assert!(container.has_for::<dyn Processor>(&"stripe".to_string()));
    }

    #[tokio::test]
    async fn test_install_failure_under_examples_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("examples/shop");
        touch(&project, "src/processors/paypal.rs");
        let scanner = Scanner::with_loader(
            Arc::new(Container::new()),
            Arc::new(LinkedModuleLoader::from_registrations([&BROKEN])),
        );

        let report = scanner.scan_default(&project).await.unwrap();

        assert_eq!(report.expected_failures, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].ends_with("src/processors/paypal.rs"));
    }
}
