//! Desktop notifications via notify-rust, mirroring each spoken announcement.

use notify_rust::Notification;
use tracing::{debug, warn};

use crate::catalog::Item;

pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn announced(&self, item: &Item) {
        self.notify(
            &format!("Page {}, item #{}", item.page, item.ordinal),
            &item.text,
        );
    }

    pub fn notify(&self, summary: &str, body: &str) {
        if !self.enabled {
            return;
        }

        debug!("Notification: {summary}");

        if let Err(e) = Notification::new()
            .summary(summary)
            .body(body)
            .appname("scav-announcer")
            .icon("dialog-information")
            .timeout(10_000)
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    }
}
