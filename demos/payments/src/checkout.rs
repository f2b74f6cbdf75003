//! A consumer that never names a concrete processor, sender or handler.

use roster::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::capabilities::{EventHandler, NotificationSender, PaymentProcessor, Receipt};

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("No payment processor registered under '{0}'")]
    UnknownProcessor(String),

    #[error("Payment through '{processor}' failed: {source}")]
    Payment {
        processor: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to resolve components: {0}")]
    Resolve(#[source] BoxError),
}

/// Charges customers and announces sign-ups through whatever is registered.
pub struct Checkout {
    container: Arc<Container>,
    processors: InjectCollection<dyn PaymentProcessor>,
    receipts: InjectOne<dyn NotificationSender>,
}

impl Checkout {
    /// Creates a checkout that sends receipts over `channel`.
    pub fn new(container: Arc<Container>, channel: impl Into<String>) -> Self {
        Self {
            processors: InjectCollection::for_capability(container.clone()),
            receipts: InjectOne::for_capability(container.clone(), channel.into()),
            container,
        }
    }

    /// Keys of every registered processor, in registration order.
    pub fn processors(&self) -> Result<Vec<String>, CheckoutError> {
        Ok(self.processors.get().map_err(CheckoutError::Resolve)?.keys())
    }

    /// Charges `customer` through the processor registered as `processor`.
    ///
    /// A receipt is sent when the configured channel is registered.
    pub fn pay(&self, processor: &str, customer: &str, cents: u64) -> Result<(Receipt, Option<String>), CheckoutError> {
        let view = self.processors.get().map_err(CheckoutError::Resolve)?;
        let Some(gateway) = view.get(&processor.to_string()) else {
            return Err(CheckoutError::UnknownProcessor(processor.to_string()));
        };

        let receipt = gateway.charge(customer, cents).map_err(|source| CheckoutError::Payment {
            processor: processor.to_string(),
            source,
        })?;
        info!(processor = gateway.display_name(), cents, "Charge succeeded");

        let notice = self
            .receipts
            .get()
            .map_err(CheckoutError::Resolve)?
            .map(|sender| sender.send(customer, &receipt.to_string()));
        if notice.is_none() {
            debug!(channel = %self.receipts.key(), "Receipt channel not registered");
        }

        Ok((receipt, notice))
    }

    /// Runs every handler registered for `event`, in registration order.
    pub fn publish(&self, event: &str, subject: &str) -> Result<Vec<String>, CheckoutError> {
        let handlers = self
            .container
            .get_all_collections_for::<dyn EventHandler>()
            .map_err(CheckoutError::Resolve)?;

        Ok(handlers
            .get(event)
            .map(|handlers| handlers.iter().map(|handler| handler.handle(subject)).collect())
            .unwrap_or_default())
    }
}
