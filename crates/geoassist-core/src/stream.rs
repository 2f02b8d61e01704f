//! Aggregation of streamed text deltas into one running message.

use geoassist_protocol::{MessageUpdate, StreamSink, UiPayload};
use log::debug;
use std::sync::Arc;

/// Accumulates text fragments for one turn and forwards the full buffer to
/// the sink after every mutation, so the UI never reconstructs state.
pub struct StreamAggregator {
    buffer: String,
    sink: Arc<dyn StreamSink>,
}

impl StreamAggregator {
    /// Create an aggregator emitting into the given sink.
    pub fn new(sink: Arc<dyn StreamSink>) -> Self {
        Self {
            buffer: String::new(),
            sink,
        }
    }

    /// Clear the buffer at the start of a new user turn.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append one fragment and emit the accumulated buffer (non-final).
    pub fn append(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        self.sink.emit(MessageUpdate {
            text: self.buffer.clone(),
            payloads: Vec::new(),
            is_final: false,
        });
    }

    /// Emit the terminal update of the turn with any rendered payloads.
    ///
    /// A blank line separates the text from the payload section when both
    /// are present.
    pub fn finalize(&mut self, payloads: Vec<UiPayload>) {
        if !payloads.is_empty() && !self.buffer.is_empty() {
            self.buffer.push_str("\n\n");
        }
        debug!(
            "finalizing turn (text_len={}, payloads={})",
            self.buffer.len(),
            payloads.len()
        );
        self.sink.emit(MessageUpdate {
            text: self.buffer.clone(),
            payloads,
            is_final: true,
        });
    }

    /// Current accumulated text.
    pub fn text(&self) -> &str {
        &self.buffer
    }
}
