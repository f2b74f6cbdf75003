//! Configuration for discovery and logging.
//!
//! Settings are layered with figment: built-in defaults, then config files,
//! then `ROSTER_*` environment variables, then programmatic overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{DiscoveryConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RosterConfig};
pub use validation::validate_config;
