//! Payment processors.

pub mod paypal;
pub mod stripe;
