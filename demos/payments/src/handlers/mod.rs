//! Event handlers. Several handlers may react to the same event.

pub mod audit;
pub mod welcome;
