//! Client abstraction over the remote assistant service.

use crate::{
    AssistantDescriptor, AssistantId, AssistantSpec, MessageContent, RunEvent, RunId, ThreadId,
    ToolOutput,
};
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// Stream of run events produced by a streamed run start or resume.
pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunEvent, ClientError>> + Send>>;

/// Errors returned by the remote assistant service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Credential was rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Generic request failure reported by the service.
    #[error("api error: {0}")]
    Api(String),
    /// A referenced handle no longer exists remotely (stale session signal).
    #[error("not found: {0}")]
    NotFound(String),
    /// The event stream broke or ended malformed.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Interface to the remote, stateful assistant service.
///
/// The orchestrator depends only on this request/response and event-stream
/// shape, not on any particular vendor protocol.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Look up an assistant descriptor by name.
    async fn find_assistant(&self, name: &str)
    -> Result<Option<AssistantDescriptor>, ClientError>;

    /// Create an assistant from the given spec.
    async fn create_assistant(&self, spec: &AssistantSpec)
    -> Result<AssistantDescriptor, ClientError>;

    /// Update an existing assistant in place from the given spec.
    async fn update_assistant(
        &self,
        id: &AssistantId,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, ClientError>;

    /// Create a new conversation thread.
    async fn create_thread(&self) -> Result<ThreadId, ClientError>;

    /// Delete a conversation thread.
    async fn delete_thread(&self, thread: &ThreadId) -> Result<(), ClientError>;

    /// Post a user message to a thread.
    async fn post_message(
        &self,
        thread: &ThreadId,
        content: MessageContent,
    ) -> Result<(), ClientError>;

    /// Start a streamed run on a thread, optionally injecting additional
    /// instructions for this turn only.
    async fn stream_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
        instructions: Option<&str>,
    ) -> Result<RunEventStream, ClientError>;

    /// Submit one atomic batch of tool outputs for a run paused in
    /// requires-action, resuming its event stream.
    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream, ClientError>;

    /// List runs on a thread that are in a non-terminal state.
    async fn list_active_runs(&self, thread: &ThreadId) -> Result<Vec<RunId>, ClientError>;

    /// Ask the service to cancel a run.
    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> Result<(), ClientError>;

    /// One-shot streamed vision completion without tool-calling.
    async fn stream_vision(&self, prompt: &str, url: &str) -> Result<RunEventStream, ClientError>;

    /// Transcribe an audio clip into text for a subsequent text turn.
    async fn transcribe_audio(&self, audio: Vec<u8>) -> Result<String, ClientError>;
}
