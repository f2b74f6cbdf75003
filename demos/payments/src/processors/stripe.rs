use std::sync::atomic::{AtomicU64, Ordering};

use roster::prelude::*;

use crate::capabilities::{PaymentProcessor, Receipt};

/// Card payments. One shared instance keeps the charge sequence.
#[derive(Debug, Default)]
#[component(PaymentProcessor)]
pub struct Stripe {
    sequence: AtomicU64,
}

impl Keyed for Stripe {
    type Key = String;

    fn key(&self) -> String {
        "stripe".to_string()
    }
}

impl PaymentProcessor for Stripe {
    fn display_name(&self) -> &str {
        "Stripe"
    }

    fn charge(&self, customer: &str, cents: u64) -> Result<Receipt, BoxError> {
        if cents < 50 {
            return Err(format!("Stripe minimum charge is 50 cents, got {cents}").into());
        }
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Receipt {
            processor: self.key(),
            customer: customer.to_string(),
            cents,
            reference: format!("ch_{n:06}"),
        })
    }
}
