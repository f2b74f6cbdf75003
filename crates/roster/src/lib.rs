//! # Roster
//!
//! A type-driven component registry with file-system auto-discovery.
//!
//! Implementations of a capability declare themselves with `#[component]`;
//! consumers ask the [`Container`](core::Container) for one implementation by
//! key, or for the whole group, without writing any wiring code.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ link time ┌────────────┐ scan ┌───────────┐ install ┌───────────┐
//! │ #[component] │─────────▶│ COMPONENTS │◀─────│ Discovery │────────▶│ Container │──▶ consumers
//! └──────────────┘           └────────────┘      └───────────┘         └───────────┘
//! ```
//!
//! - **Capabilities**: traits marked `#[capability]`, keyed through [`Keyed`](core::Keyed)
//! - **Components**: types marked `#[component(Trait)]`
//! - **Container**: one registry per group, singleton and transient entries
//! - **Discovery**: scans source roots and installs what each file declares
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roster::prelude::*;
//!
//! #[capability("payment-processors")]
//! pub trait PaymentProcessor: Keyed<Key = String> {
//!     fn charge(&self, cents: u64) -> String;
//! }
//!
//! #[derive(Default)]
//! #[component(PaymentProcessor)]
//! pub struct Stripe;
//!
//! impl Keyed for Stripe {
//!     type Key = String;
//!     fn key(&self) -> String { "stripe".into() }
//! }
//!
//! impl PaymentProcessor for Stripe {
//!     fn charge(&self, cents: u64) -> String { format!("stripe:{cents}") }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let container = Arc::new(Container::new());
//!     Discovery::new(container.clone())
//!         .working_dir(env!("CARGO_MANIFEST_DIR"))
//!         .initialize(&["src"], None)
//!         .await?;
//!
//!     let stripe = container.get_for::<dyn PaymentProcessor>(&"stripe".into())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `roster.toml` configuration files (default)
//! - `yaml-config`: `roster.yaml` configuration files
//! - `json-log`: JSON log output

pub use roster_core as core;
pub use roster_discovery as discovery;
pub use roster_macros::{capability, component};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use roster::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Attributes
    pub use roster_macros::{capability, component};

    // Contract and container
    pub use roster_core::{
        BoxError, CapabilityMeta, Container, InjectCollection, InjectOne, Keyed, RegistryError,
        SingletonView,
    };

    // Discovery
    pub use roster_discovery::{Discovery, ScanPatterns, Scanner};
    pub use roster_discovery::config::{ConfigLoader, RosterConfig};
}
