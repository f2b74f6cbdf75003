//! # Roster Discovery
//!
//! Finds component source files on disk and installs the components they
//! declare into a [`Container`](roster_core::Container).
//!
//! ## Pieces
//!
//! - [`Scanner`]: enumerates files under a root with include/exclude globs
//!   and loads them in bounded concurrent waves, at most once per file
//! - [`ModuleLoader`]: turns one file into registered components;
//!   [`LinkedModuleLoader`] installs the `#[component]` registrations linked
//!   into the binary
//! - [`Discovery`]: runs the whole scan sequence once per context
//! - [`config`]: figment-layered settings (`roster.toml`, `ROSTER_*`)
//! - [`logging`]: `tracing-subscriber` setup driven by the same config
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use roster_core::Container;
//! use roster_discovery::{Discovery, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let discovery = Discovery::from_config(Arc::new(Container::new()), &config);
//! discovery.initialize_configured().await?;
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod logging;
pub mod patterns;
pub mod scanner;

pub use discovery::Discovery;
pub use error::{LoadError, ScanError, ScanResult};
pub use loader::{LinkedModuleLoader, LoadedComponent, LoadedModule, ModuleLoader};
pub use patterns::{DEFAULT_EXCLUDE, DEFAULT_INCLUDE, ScanPatterns, TEST_SOURCE_PATTERNS};
pub use scanner::{LoadOutcome, RootState, ScanOptions, ScanReport, ScanStats, Scanner};
