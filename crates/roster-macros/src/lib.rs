//! Procedural macros for the Roster component registry.
//!
//! This crate provides:
//!
//! - `#[capability]` - Names the group a capability trait's implementations join
//! - `#[component]` - Registers a type into its capability's group when the
//!   declaring file is loaded
//!
//! Generated code refers to the `roster` facade crate, so depend on `roster`
//! rather than on this crate directly.

mod capability;
mod component;

use proc_macro::TokenStream;

/// Marks a trait as a capability and names its group.
///
/// ```rust,ignore
/// use roster::prelude::*;
///
/// // Group "payment-processors"
/// #[capability("payment-processors")]
/// pub trait PaymentProcessor: Keyed<Key = String> {
///     fn charge(&self, cents: u64) -> Result<String, BoxError>;
/// }
///
/// // Group "NotificationSender"
/// #[capability]
/// pub trait NotificationSender: Keyed<Key = String> {}
/// ```
#[proc_macro_attribute]
pub fn capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    capability::expand_capability(attr.into(), item.into()).into()
}

/// Registers a struct or enum as an implementation of a capability.
///
/// # Options
///
/// | Option | Description |
/// |--------|-------------|
/// | first argument | Capability trait (required) |
/// | `group = "…"` | Register under this group instead of the capability's |
/// | `transient` | Construct a fresh instance on every resolution |
/// | `singleton` | Share one instance per registration (default) |
/// | `factory = path` | `fn() -> Result<Self, E>` used instead of `Default` |
///
/// ```rust,ignore
/// #[derive(Default)]
/// #[component(PaymentProcessor)]
/// pub struct Stripe;
///
/// #[component(PaymentProcessor, transient, factory = PayPal::from_env)]
/// pub struct PayPal { client_id: String }
/// ```
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    component::expand_component(attr.into(), item.into()).into()
}
