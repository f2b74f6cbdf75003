use roster::prelude::*;

use crate::capabilities::{PaymentProcessor, Receipt};

/// PayPal checkout. Built fresh for every resolution from the environment.
#[derive(Debug)]
#[component(PaymentProcessor, transient, factory = PayPal::from_env)]
pub struct PayPal {
    client_id: String,
}

impl PayPal {
    /// Reads `PAYPAL_CLIENT_ID`, falling back to the sandbox client.
    pub fn from_env() -> Result<Self, BoxError> {
        let client_id = std::env::var("PAYPAL_CLIENT_ID").unwrap_or_else(|_| "sandbox".to_string());
        if client_id.trim().is_empty() {
            return Err("PAYPAL_CLIENT_ID is set but empty".into());
        }
        Ok(Self { client_id })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl Keyed for PayPal {
    type Key = String;

    fn key(&self) -> String {
        "paypal".to_string()
    }
}

impl PaymentProcessor for PayPal {
    fn display_name(&self) -> &str {
        "PayPal"
    }

    fn charge(&self, customer: &str, cents: u64) -> Result<Receipt, BoxError> {
        Ok(Receipt {
            processor: self.key(),
            customer: customer.to_string(),
            cents,
            reference: format!("PAY-{}-{cents}", self.client_id.to_uppercase()),
        })
    }
}
