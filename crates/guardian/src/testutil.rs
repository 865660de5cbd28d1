//! Shared fakes for unit tests.

use async_trait::async_trait;
use notify::{AlertEvent, AlertSink};
use std::sync::Mutex;

/// Alert sink that keeps every alert in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contents(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.content).collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send_alert(&self, event: AlertEvent) {
        self.events.lock().unwrap().push(event);
    }
}
