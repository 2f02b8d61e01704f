//! Consumption of one run-event stream into a round outcome.

use crate::error::GeoAssistError;
use crate::stream::StreamAggregator;
use futures_util::StreamExt;
use geoassist_protocol::{RunEvent, RunEventStream, RunId, RunStatus, ToolCall};
use log::debug;

/// Resolution of one streamed round of a run.
#[derive(Debug)]
pub(crate) enum RoundOutcome {
    /// Run paused waiting for tool outputs.
    RequiresAction {
        run_id: RunId,
        tool_calls: Vec<ToolCall>,
    },
    /// Run reached a terminal status.
    Terminal { run_id: RunId, status: RunStatus },
}

/// Drive one event stream to its resolution.
///
/// Text deltas are appended to the aggregator strictly in emission order.
/// A stream that ends without a requires-action or terminal event is a
/// stream error.
pub(crate) async fn drive_round(
    mut events: RunEventStream,
    aggregator: &mut StreamAggregator,
) -> Result<RoundOutcome, GeoAssistError> {
    while let Some(event) = events.next().await {
        match event? {
            RunEvent::TextDelta { delta } => aggregator.append(&delta),
            RunEvent::RequiresAction { run_id, tool_calls } => {
                debug!(
                    "run requires action (run_id={}, tool_calls={})",
                    run_id,
                    tool_calls.len()
                );
                return Ok(RoundOutcome::RequiresAction { run_id, tool_calls });
            }
            RunEvent::Terminal { run_id, status } => {
                debug!(
                    "run reached terminal status (run_id={}, status={})",
                    run_id,
                    status.as_str()
                );
                return Ok(RoundOutcome::Terminal { run_id, status });
            }
        }
    }
    Err(GeoAssistError::Stream(
        "run stream ended without a terminal or requires-action event".to_string(),
    ))
}
