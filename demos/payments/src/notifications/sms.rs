use roster::prelude::*;

use crate::capabilities::NotificationSender;

/// Text messages, truncated to one segment.
#[derive(Debug, Default)]
#[component(NotificationSender, transient)]
pub struct Sms;

const SEGMENT: usize = 160;

impl Keyed for Sms {
    type Key = String;

    fn key(&self) -> String {
        "sms".to_string()
    }
}

impl NotificationSender for Sms {
    fn send(&self, recipient: &str, body: &str) -> String {
        let body: String = body.chars().take(SEGMENT).collect();
        format!("sms to {recipient}: {body}")
    }
}
