//! Payments Demo
//!
//! Payment processors, notification senders and event handlers that register
//! themselves with `#[component]`. Nothing in this crate lists them: the
//! [`Checkout`](checkout::Checkout) consumer finds them through the container
//! after discovery has scanned `src/`.
//!
//! ```text
//! src/processors/{stripe,paypal}.rs   → "payment-processors"
//! src/notifications/{email,sms}.rs    → "notification-senders"
//! src/handlers/{welcome,audit}.rs     → "event-handlers" (both on "user_signup")
//! ```

pub mod capabilities;
pub mod checkout;
pub mod handlers;
pub mod notifications;
pub mod processors;

use std::path::PathBuf;

/// Directory holding this crate's sources, for discovery.
pub fn source_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src")
}
