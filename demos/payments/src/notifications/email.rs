use roster::prelude::*;

use crate::capabilities::NotificationSender;

#[derive(Debug, Default)]
#[component(NotificationSender)]
pub struct Email;

impl Keyed for Email {
    type Key = String;

    fn key(&self) -> String {
        "email".to_string()
    }
}

impl NotificationSender for Email {
    fn send(&self, recipient: &str, body: &str) -> String {
        format!("email to {recipient}@example.com: {body}")
    }
}
