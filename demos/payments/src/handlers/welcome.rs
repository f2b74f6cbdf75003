use roster::prelude::*;

use crate::capabilities::EventHandler;

#[derive(Debug, Default)]
#[component(EventHandler)]
pub struct WelcomeEmail;

impl Keyed for WelcomeEmail {
    type Key = String;

    fn key(&self) -> String {
        "user_signup".to_string()
    }
}

impl EventHandler for WelcomeEmail {
    fn handle(&self, subject: &str) -> String {
        format!("queued welcome email for {subject}")
    }
}
