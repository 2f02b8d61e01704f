//! Recording stream sink for assertions on UI updates.

use geoassist_protocol::{MessageUpdate, StreamSink};
use parking_lot::Mutex;

/// Sink that records every update it receives.
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<MessageUpdate>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates received, in order.
    pub fn updates(&self) -> Vec<MessageUpdate> {
        self.updates.lock().clone()
    }

    /// The last update received, which should carry `is_final`.
    pub fn last_update(&self) -> Option<MessageUpdate> {
        self.updates.lock().last().cloned()
    }
}

impl StreamSink for RecordingSink {
    fn emit(&self, update: MessageUpdate) {
        self.updates.lock().push(update);
    }
}
