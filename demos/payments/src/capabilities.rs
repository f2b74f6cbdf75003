//! The capabilities this application's components implement.

use std::fmt;

use roster::prelude::*;

/// Charges a customer through one payment provider.
#[capability("payment-processors")]
pub trait PaymentProcessor: Keyed<Key = String> {
    /// Human readable provider name.
    fn display_name(&self) -> &str;

    fn charge(&self, customer: &str, cents: u64) -> Result<Receipt, BoxError>;
}

/// Delivers a message to a recipient over one channel.
#[capability("notification-senders")]
pub trait NotificationSender: Keyed<Key = String> {
    fn send(&self, recipient: &str, body: &str) -> String;
}

/// Reacts to a named application event. Several handlers may share a key.
#[capability("event-handlers")]
pub trait EventHandler: Keyed<Key = String> {
    fn handle(&self, subject: &str) -> String;
}

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub processor: String,
    pub customer: String,
    pub cents: u64,
    pub reference: String,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} charged {} ${}.{:02} ({})",
            self.processor,
            self.customer,
            self.cents / 100,
            self.cents % 100,
            self.reference
        )
    }
}
