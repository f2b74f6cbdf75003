use roster::prelude::*;

use crate::capabilities::EventHandler;

/// Records sign-ups. Registered under the same event as the welcome email.
#[derive(Debug, Default)]
#[component(EventHandler)]
pub struct SignupAudit;

impl Keyed for SignupAudit {
    type Key = String;

    fn key(&self) -> String {
        "user_signup".to_string()
    }
}

impl EventHandler for SignupAudit {
    fn handle(&self, subject: &str) -> String {
        format!("audit: {subject} signed up")
    }
}
