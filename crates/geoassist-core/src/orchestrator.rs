//! Mutex-serialized entry point driving one user turn end to end.

use crate::config::AssistantConfig;
use crate::error::GeoAssistError;
use crate::run::{RoundOutcome, drive_round};
use crate::session::{SessionHandle, SessionManager};
use crate::stream::StreamAggregator;
use geoassist_protocol::{
    AssistantClient, ClientError, MessageContent, RunStatus, StreamSink, ToolCall, ToolOutput,
};
use geoassist_tools::{ToolContext, ToolDispatcher, ToolRegistry};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fixed user-facing message surfaced when the session cannot be
/// established; the next turn retries establishment from scratch.
pub const SESSION_FAILURE_MESSAGE: &str =
    "Sorry, I can't reach the assistant service right now. \
     Please try again in a moment or contact support if the problem persists.";

/// Top-level orchestrator composing session management, tool dispatch, and
/// streaming aggregation under a single turn mutex.
///
/// The mutex serializes the entire body of every orchestration call — text
/// turns, the instruction-injection path, image turns, transcription, and
/// teardown all read and mutate the same thread, and interleaving two turns
/// would corrupt the remote conversation order. `tokio::sync::Mutex` queues
/// waiters FIFO, so rapid-fire turns run in submission order.
pub struct Orchestrator {
    session: SessionManager,
    dispatcher: ToolDispatcher,
    sink: Arc<dyn StreamSink>,
    turn_lock: Mutex<()>,
}

impl Orchestrator {
    /// Build an orchestrator over a remote client, configuration, tool
    /// registry, application context, and UI stream sink.
    pub fn new(
        client: Arc<dyn AssistantClient>,
        config: AssistantConfig,
        registry: ToolRegistry,
        context: ToolContext,
        sink: Arc<dyn StreamSink>,
    ) -> Self {
        let tool_specs = registry.function_specs();
        info!(
            "initializing orchestrator (assistant={}, version={}, tools={})",
            config.name,
            config.version,
            tool_specs.len()
        );
        Self {
            session: SessionManager::new(client, config, tool_specs),
            dispatcher: ToolDispatcher::new(registry, context),
            sink,
            turn_lock: Mutex::new(()),
        }
    }

    /// Borrow the session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Process one text turn. Never returns an error to the caller: every
    /// failure resolves to sink output.
    pub async fn process_message(&self, text: &str) {
        self.text_turn(text, None).await;
    }

    /// Process one text turn with additional per-turn instructions injected
    /// into the run.
    pub async fn process_message_with_instructions(&self, text: &str, instructions: &str) {
        self.text_turn(text, Some(instructions)).await;
    }

    /// Process one image turn: a one-shot streamed completion without
    /// tool-calling, finalized through the same sink contract.
    pub async fn process_image(&self, prompt: &str, url: &str) {
        let _guard = self.turn_lock.lock().await;
        let mut aggregator = StreamAggregator::new(self.sink.clone());
        let outcome = async {
            let events = self.session.client().stream_vision(prompt, url).await?;
            match drive_round(events, &mut aggregator).await? {
                RoundOutcome::Terminal { .. } => Ok(()),
                RoundOutcome::RequiresAction { run_id, .. } => Err(GeoAssistError::Stream(
                    format!("vision completion requested tool execution (run_id={run_id})"),
                )),
            }
        }
        .await;
        if let Err(err) = outcome {
            error!("image turn failed: {}", err);
        }
        aggregator.finalize(Vec::new());
    }

    /// Transcribe an audio clip under the turn mutex. The transcript feeds a
    /// subsequent text turn, so this is the one path that returns a result.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GeoAssistError> {
        let _guard = self.turn_lock.lock().await;
        Ok(self.session.client().transcribe_audio(audio).await?)
    }

    /// Tear the remote session down under the turn mutex.
    pub async fn teardown(&self) {
        let _guard = self.turn_lock.lock().await;
        self.session.teardown().await;
    }

    async fn text_turn(&self, text: &str, instructions: Option<&str>) {
        let _guard = self.turn_lock.lock().await;
        let mut aggregator = StreamAggregator::new(self.sink.clone());
        if let Err(err) = self.run_text_turn(text, instructions, &mut aggregator).await {
            match err {
                GeoAssistError::SessionUnavailable(reason) => {
                    error!("session unavailable: {}", reason);
                    aggregator.reset();
                    aggregator.append(SESSION_FAILURE_MESSAGE);
                    aggregator.finalize(Vec::new());
                }
                err => {
                    // Mid-run failure: finalize with whatever partial text
                    // was streamed.
                    error!("turn failed mid-run: {}", err);
                    aggregator.finalize(Vec::new());
                }
            }
        }
    }

    async fn run_text_turn(
        &self,
        text: &str,
        instructions: Option<&str>,
        aggregator: &mut StreamAggregator,
    ) -> Result<(), GeoAssistError> {
        let handle = self.establish().await?;

        // At most one logical run per thread: an overlapping prior run would
        // corrupt shared thread state.
        self.session.cancel_active_runs(&handle.thread).await;

        let handle = match self.post_user_message(&handle, text).await {
            Ok(()) => handle,
            Err(ClientError::NotFound(reason)) => {
                // Stale session: handles exist but are no longer valid
                // remotely. One re-establishment before giving up.
                warn!(
                    "stale session detected (thread_id={}): {}",
                    handle.thread, reason
                );
                self.session.invalidate();
                let handle = self.establish().await?;
                self.post_user_message(&handle, text)
                    .await
                    .map_err(|err| GeoAssistError::SessionUnavailable(err.to_string()))?;
                handle
            }
            Err(err) => return Err(err.into()),
        };

        aggregator.reset();
        let client = self.session.client().clone();
        let mut events = client
            .stream_run(&handle.thread, &handle.assistant.id, instructions)
            .await?;

        let mut previous_outputs: Vec<ToolOutput> = Vec::new();
        let mut previous_names: Option<Vec<String>> = None;
        let mut last_round: Option<(Vec<ToolCall>, Vec<ToolOutput>)> = None;

        loop {
            match drive_round(events, aggregator).await? {
                RoundOutcome::RequiresAction { run_id, tool_calls } => {
                    let names: Vec<String> =
                        tool_calls.iter().map(|call| call.name.clone()).collect();
                    if repeats_single_name(previous_names.as_deref(), &names) {
                        // Heuristic defense against a request/response cycle
                        // that re-invokes the same tool without progress.
                        // Does not catch alternating two-function loops.
                        warn!(
                            "aborting run on repeated tool request (run_id={}, tool={})",
                            run_id, names[0]
                        );
                        if let Err(err) = client.cancel_run(&handle.thread, &run_id).await {
                            warn!("failed to cancel aborted run (run_id={}): {}", run_id, err);
                        }
                        aggregator.finalize(Vec::new());
                        return Ok(());
                    }

                    let outputs = self.dispatcher.dispatch(&tool_calls, &previous_outputs).await;
                    // One atomic batched resume per round.
                    events = client
                        .submit_tool_outputs(&handle.thread, &run_id, outputs.clone())
                        .await?;
                    previous_outputs.extend(outputs.iter().cloned());
                    previous_names = Some(names);
                    last_round = Some((tool_calls, outputs));
                }
                RoundOutcome::Terminal { run_id, status } => {
                    if status == RunStatus::Completed {
                        // Only the final round's outputs are user-visible;
                        // earlier rounds fed later calls and stay unrendered.
                        let payloads = match &last_round {
                            Some((calls, outputs)) => self.dispatcher.render_batch(calls, outputs),
                            None => Vec::new(),
                        };
                        aggregator.finalize(payloads);
                    } else {
                        warn!(
                            "run ended without completion (run_id={}, status={})",
                            run_id,
                            status.as_str()
                        );
                        aggregator.finalize(Vec::new());
                    }
                    return Ok(());
                }
            }
        }
    }

    async fn establish(&self) -> Result<SessionHandle, GeoAssistError> {
        self.session
            .ensure()
            .await
            .map_err(|err| GeoAssistError::SessionUnavailable(err.to_string()))
    }

    async fn post_user_message(
        &self,
        handle: &SessionHandle,
        text: &str,
    ) -> Result<(), ClientError> {
        self.session
            .client()
            .post_message(
                &handle.thread,
                MessageContent::Text {
                    content: text.to_string(),
                },
            )
            .await
    }
}

/// Loop-abort check: the previous round and this round each requested the
/// same single function name.
fn repeats_single_name(previous: Option<&[String]>, current: &[String]) -> bool {
    match previous {
        Some([previous_name]) => matches!(current, [name] if name == previous_name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::repeats_single_name;

    #[test]
    fn repeat_detection_matches_single_names_only() {
        let prev = vec!["histogram".to_string()];
        assert!(repeats_single_name(Some(&prev), &["histogram".to_string()]));
        assert!(!repeats_single_name(Some(&prev), &["boxplot".to_string()]));
        assert!(!repeats_single_name(
            Some(&prev),
            &["histogram".to_string(), "boxplot".to_string()]
        ));
        let pair = vec!["histogram".to_string(), "boxplot".to_string()];
        assert!(!repeats_single_name(Some(&pair), &["histogram".to_string()]));
        assert!(!repeats_single_name(None, &["histogram".to_string()]));
    }
}
