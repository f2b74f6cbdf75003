//! Notification channels.

pub mod email;
pub mod sms;
