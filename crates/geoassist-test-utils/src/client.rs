//! Scripted assistant client for orchestrator tests.

use async_trait::async_trait;
use futures_util::stream;
use geoassist_protocol::{
    AssistantClient, AssistantDescriptor, AssistantId, AssistantSpec, ClientError, MessageContent,
    RunEvent, RunEventStream, RunId, RunStatus, ThreadId, ToolCall, ToolOutput,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use uuid::Uuid;

/// One scripted round of a run: the deltas it streams and how it resolves.
#[derive(Debug, Clone)]
pub struct ScriptedRound {
    deltas: Vec<String>,
    outcome: ScriptedOutcome,
}

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Complete,
    RequiresAction(Vec<ToolCall>),
    Terminate(RunStatus),
}

impl ScriptedRound {
    /// A round that streams the given fragments and completes.
    pub fn completes(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|delta| delta.to_string()).collect(),
            outcome: ScriptedOutcome::Complete,
        }
    }

    /// A round that streams the given fragments and pauses for tools.
    pub fn requires_action(deltas: &[&str], tool_calls: Vec<ToolCall>) -> Self {
        Self {
            deltas: deltas.iter().map(|delta| delta.to_string()).collect(),
            outcome: ScriptedOutcome::RequiresAction(tool_calls),
        }
    }

    /// A round that ends in the given terminal status.
    pub fn terminates(status: RunStatus) -> Self {
        Self {
            deltas: Vec::new(),
            outcome: ScriptedOutcome::Terminate(status),
        }
    }
}

#[derive(Default)]
struct MockState {
    script: VecDeque<ScriptedRound>,
    vision_chunks: Vec<String>,
    remote_assistant: Option<AssistantDescriptor>,
    active_runs: Vec<RunId>,
    fail_find: bool,
    stale_posts_remaining: u32,
    transcript: String,
    run_seq: u32,
    created_assistants: u32,
    updated_assistants: u32,
    created_threads: u32,
    deleted_threads: Vec<ThreadId>,
    posted: Vec<(ThreadId, MessageContent)>,
    run_instructions: Vec<Option<String>>,
    submissions: Vec<(RunId, Vec<ToolOutput>)>,
    cancelled: Vec<RunId>,
    ops: Vec<String>,
}

/// Assistant client that replays a scripted sequence of run rounds and
/// records every operation it receives.
#[derive(Default)]
pub struct MockAssistantClient {
    state: Mutex<MockState>,
}

impl MockAssistantClient {
    /// Create a client with an empty script; unscripted runs complete with
    /// no output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one scripted round to the replay queue.
    pub fn with_round(self, round: ScriptedRound) -> Self {
        self.state.lock().script.push_back(round);
        self
    }

    /// Seed the remote side with an existing assistant descriptor.
    pub fn with_existing_assistant(self, descriptor: AssistantDescriptor) -> Self {
        self.state.lock().remote_assistant = Some(descriptor);
        self
    }

    /// Seed the thread with a non-terminal run to be cancelled.
    pub fn with_active_run(self, run_id: impl Into<RunId>) -> Self {
        self.state.lock().active_runs.push(run_id.into());
        self
    }

    /// Make every assistant lookup fail (session establishment failure).
    pub fn with_find_failure(self) -> Self {
        self.state.lock().fail_find = true;
        self
    }

    /// Make the next `count` message posts fail with `NotFound` (stale
    /// session signal).
    pub fn with_stale_posts(self, count: u32) -> Self {
        self.state.lock().stale_posts_remaining = count;
        self
    }

    /// Set the chunks streamed by the vision path.
    pub fn with_vision_chunks(self, chunks: &[&str]) -> Self {
        self.state.lock().vision_chunks = chunks.iter().map(|chunk| chunk.to_string()).collect();
        self
    }

    /// Set the transcript returned by audio transcription.
    pub fn with_transcript(self, transcript: impl Into<String>) -> Self {
        self.state.lock().transcript = transcript.into();
        self
    }

    /// Ordered names of every operation received.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().ops.clone()
    }

    /// Number of assistants created.
    pub fn created_assistants(&self) -> u32 {
        self.state.lock().created_assistants
    }

    /// Number of in-place assistant updates.
    pub fn updated_assistants(&self) -> u32 {
        self.state.lock().updated_assistants
    }

    /// Number of threads created.
    pub fn created_threads(&self) -> u32 {
        self.state.lock().created_threads
    }

    /// Threads deleted via teardown.
    pub fn deleted_threads(&self) -> Vec<ThreadId> {
        self.state.lock().deleted_threads.clone()
    }

    /// Messages posted, in order.
    pub fn posted_messages(&self) -> Vec<(ThreadId, MessageContent)> {
        self.state.lock().posted.clone()
    }

    /// Per-turn instructions passed to each run start, in order.
    pub fn run_instructions(&self) -> Vec<Option<String>> {
        self.state.lock().run_instructions.clone()
    }

    /// Tool-output batches submitted, in order.
    pub fn submissions(&self) -> Vec<(RunId, Vec<ToolOutput>)> {
        self.state.lock().submissions.clone()
    }

    /// Runs the orchestrator asked to cancel, in order.
    pub fn cancelled_runs(&self) -> Vec<RunId> {
        self.state.lock().cancelled.clone()
    }

    fn next_round(&self, run_id: RunId) -> RunEventStream {
        let round = self
            .state
            .lock()
            .script
            .pop_front()
            .unwrap_or_else(|| ScriptedRound::completes(&[]));
        build_stream(round, run_id)
    }
}

fn build_stream(round: ScriptedRound, run_id: RunId) -> RunEventStream {
    let mut events: Vec<Result<RunEvent, ClientError>> = round
        .deltas
        .into_iter()
        .map(|delta| Ok(RunEvent::TextDelta { delta }))
        .collect();
    events.push(Ok(match round.outcome {
        ScriptedOutcome::Complete => RunEvent::Terminal {
            run_id,
            status: RunStatus::Completed,
        },
        ScriptedOutcome::RequiresAction(tool_calls) => RunEvent::RequiresAction {
            run_id,
            tool_calls,
        },
        ScriptedOutcome::Terminate(status) => RunEvent::Terminal { run_id, status },
    }));
    Box::pin(stream::iter(events))
}

#[async_trait]
impl AssistantClient for MockAssistantClient {
    async fn find_assistant(
        &self,
        name: &str,
    ) -> Result<Option<AssistantDescriptor>, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("find_assistant".to_string());
        if state.fail_find {
            return Err(ClientError::Api("lookup unavailable".to_string()));
        }
        Ok(state
            .remote_assistant
            .clone()
            .filter(|descriptor| descriptor.name == name))
    }

    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("create_assistant".to_string());
        state.created_assistants += 1;
        let descriptor = AssistantDescriptor {
            id: format!("asst-{}", Uuid::new_v4()),
            name: spec.name.clone(),
            version: spec.version.clone(),
        };
        state.remote_assistant = Some(descriptor.clone());
        Ok(descriptor)
    }

    async fn update_assistant(
        &self,
        id: &AssistantId,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("update_assistant".to_string());
        state.updated_assistants += 1;
        let descriptor = AssistantDescriptor {
            id: id.clone(),
            name: spec.name.clone(),
            version: spec.version.clone(),
        };
        state.remote_assistant = Some(descriptor.clone());
        Ok(descriptor)
    }

    async fn create_thread(&self) -> Result<ThreadId, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("create_thread".to_string());
        state.created_threads += 1;
        Ok(format!("thread-{}", state.created_threads))
    }

    async fn delete_thread(&self, thread: &ThreadId) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.ops.push("delete_thread".to_string());
        state.deleted_threads.push(thread.clone());
        Ok(())
    }

    async fn post_message(
        &self,
        thread: &ThreadId,
        content: MessageContent,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.ops.push("post_message".to_string());
        if state.stale_posts_remaining > 0 {
            state.stale_posts_remaining -= 1;
            return Err(ClientError::NotFound(format!("thread {thread} is gone")));
        }
        state.posted.push((thread.clone(), content));
        Ok(())
    }

    async fn stream_run(
        &self,
        _thread: &ThreadId,
        _assistant: &AssistantId,
        instructions: Option<&str>,
    ) -> Result<RunEventStream, ClientError> {
        let run_id = {
            let mut state = self.state.lock();
            state.ops.push("stream_run".to_string());
            state
                .run_instructions
                .push(instructions.map(|instructions| instructions.to_string()));
            state.run_seq += 1;
            format!("run-{}", state.run_seq)
        };
        Ok(self.next_round(run_id))
    }

    async fn submit_tool_outputs(
        &self,
        _thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream, ClientError> {
        {
            let mut state = self.state.lock();
            state.ops.push("submit_tool_outputs".to_string());
            state.submissions.push((run.clone(), outputs));
        }
        Ok(self.next_round(run.clone()))
    }

    async fn list_active_runs(&self, _thread: &ThreadId) -> Result<Vec<RunId>, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("list_active_runs".to_string());
        Ok(state.active_runs.clone())
    }

    async fn cancel_run(&self, _thread: &ThreadId, run: &RunId) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.ops.push("cancel_run".to_string());
        state.cancelled.push(run.clone());
        state.active_runs.retain(|active| active != run);
        Ok(())
    }

    async fn stream_vision(&self, _prompt: &str, _url: &str) -> Result<RunEventStream, ClientError> {
        let (chunks, run_id) = {
            let mut state = self.state.lock();
            state.ops.push("stream_vision".to_string());
            state.run_seq += 1;
            (state.vision_chunks.clone(), format!("run-{}", state.run_seq))
        };
        let round = ScriptedRound {
            deltas: chunks,
            outcome: ScriptedOutcome::Complete,
        };
        Ok(build_stream(round, run_id))
    }

    async fn transcribe_audio(&self, _audio: Vec<u8>) -> Result<String, ClientError> {
        let mut state = self.state.lock();
        state.ops.push("transcribe_audio".to_string());
        Ok(state.transcript.clone())
    }
}
