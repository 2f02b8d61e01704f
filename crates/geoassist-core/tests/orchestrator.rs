//! Orchestrator integration tests against the scripted mock client.

use geoassist_core::{AssistantConfig, Orchestrator, SESSION_FAILURE_MESSAGE};
use geoassist_protocol::{MessageContent, RunStatus, ToolCall};
use geoassist_test_utils::{
    DummyTool, FailingTool, MockAssistantClient, RecordingSink, RecordingTool, ScriptedRound,
};
use geoassist_tools::{ToolContext, ToolRegistry};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn config() -> AssistantConfig {
    AssistantConfig::builder()
        .api_key("sk-test")
        .name("geoassist")
        .instructions("You are a spatial analysis assistant.")
        .version("1.0.0")
        .build()
}

fn orchestrator(
    client: Arc<MockAssistantClient>,
    registry: ToolRegistry,
    sink: Arc<RecordingSink>,
) -> Orchestrator {
    Orchestrator::new(client, config(), registry, ToolContext::empty(), sink)
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// A plain text turn streams deltas and finalizes with the full message.
#[tokio::test]
async fn text_turn_streams_and_finalizes() {
    let client = Arc::new(
        MockAssistantClient::new().with_round(ScriptedRound::completes(&["Hello ", "world"])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("hi").await;

    let updates = sink.updates();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].text, "Hello ");
    assert_eq!(updates[1].text, "Hello world");
    assert!(!updates[1].is_final);
    assert_eq!(updates[2].text, "Hello world");
    assert!(updates[2].is_final);
    for pair in updates.windows(2) {
        assert!(pair[1].text.starts_with(&pair[0].text));
    }

    let posted = client.posted_messages();
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].1,
        MessageContent::Text {
            content: "hi".to_string()
        }
    );
}

/// One requires-action round runs the tool, resumes, and renders its payload.
#[tokio::test]
async fn histogram_round_trip_renders_payload() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(
        DummyTool::new("histogram")
            .with_description("create a histogram for a variable")
            .with_properties(json!({
                "k": { "type": "number" },
                "variable_name": { "type": "string" },
            }))
            .with_result(json!({ "type": "histogram", "k": 5, "variable_name": "income" }))
            .with_render(),
    ));
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call(
                    "call-1",
                    "histogram",
                    r#"{"k":5,"variable_name":"income"}"#,
                )],
            ))
            .with_round(ScriptedRound::completes(&["Here is your histogram."])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), registry, sink.clone());

    orchestrator.process_message("histogram of income").await;

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1.len(), 1);
    assert_eq!(submissions[0].1[0].tool_call_id, "call-1");
    assert_eq!(submissions[0].1[0].output["type"], "histogram");

    let last = sink.last_update().expect("final update");
    assert!(last.is_final);
    assert_eq!(last.payloads.len(), 1);
    assert_eq!(last.payloads[0].tool_name, "histogram");
    assert!(last.text.starts_with("Here is your histogram."));
}

/// A failing callback becomes a structured output; the run still completes
/// and no error reaches the caller.
#[tokio::test]
async fn failing_tool_is_isolated() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(FailingTool::new("lisa", "bad column")));
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call("call-1", "lisa", "{}")],
            ))
            .with_round(ScriptedRound::completes(&["That variable does not exist."])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), registry, sink.clone());

    orchestrator.process_message("lisa on typo_column").await;

    let submissions = client.submissions();
    assert_eq!(submissions[0].1.len(), 1);
    assert_eq!(submissions[0].1[0].output["success"], false);
    let details = submissions[0].1[0].output["details"]
        .as_str()
        .expect("details");
    assert!(details.contains("bad column"), "details: {details}");
    assert!(sink.last_update().expect("final").is_final);
}

/// An unregistered tool name yields exactly one structured error output and
/// leaves the batch size unchanged.
#[tokio::test]
async fn unknown_tool_yields_structured_output() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![
                    tool_call("call-1", "quantile_map", r#"{"k":4}"#),
                    tool_call("call-2", "quantile_map", r#"{"k":6}"#),
                ],
            ))
            .with_round(ScriptedRound::completes(&["Sorry, I cannot map that."])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("quantile map please").await;

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1.len(), 2);
    for output in &submissions[0].1 {
        assert_eq!(output.output["success"], false);
    }
    assert!(sink.last_update().expect("final").is_final);
}

/// Two consecutive rounds requesting the same single tool terminate the run
/// instead of submitting a third round.
#[tokio::test]
async fn repeated_single_tool_request_aborts_the_run() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(DummyTool::new("histogram")));
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call("call-1", "histogram", "{}")],
            ))
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call("call-2", "histogram", "{}")],
            )),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), registry, sink.clone());

    orchestrator.process_message("histogram forever").await;

    assert_eq!(client.submissions().len(), 1);
    assert_eq!(client.cancelled_runs(), vec!["run-1".to_string()]);
    assert!(sink.last_update().expect("final").is_final);
}

/// Different tools across rounds do not trip the loop-abort heuristic, and
/// the second round's tool observes the first round's outputs.
#[tokio::test]
async fn previous_outputs_thread_across_rounds() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(
        DummyTool::new("create_weights").with_result(json!({ "weights_id": "w-queen" })),
    ));
    let (lisa, seen) = RecordingTool::new("lisa");
    registry.register(Arc::new(lisa));
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call("call-1", "create_weights", r#"{"type":"queen"}"#)],
            ))
            .with_round(ScriptedRound::requires_action(
                &[],
                vec![tool_call("call-2", "lisa", "{}")],
            ))
            .with_round(ScriptedRound::completes(&["Cluster map ready."])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), registry, sink.clone());

    orchestrator.process_message("lisa with queen weights").await;

    assert_eq!(client.submissions().len(), 2);
    let invocations = seen.lock();
    assert_eq!(invocations.len(), 1);
    let previous = &invocations[0].1;
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].tool_call_id, "call-1");
    assert_eq!(previous[0].output["weights_id"], "w-queen");
}

/// A prior non-terminal run on the thread is cancelled before the new
/// message is posted.
#[tokio::test]
async fn active_runs_are_cancelled_before_posting() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_active_run("run-stale")
            .with_round(ScriptedRound::completes(&["done"])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("new turn").await;

    assert_eq!(client.cancelled_runs(), vec!["run-stale".to_string()]);
    let ops = client.ops();
    let cancel = ops.iter().position(|op| op == "cancel_run").expect("cancel");
    let post = ops.iter().position(|op| op == "post_message").expect("post");
    assert!(cancel < post, "ops: {ops:?}");
}

/// Session establishment is idempotent across turns: one assistant, one
/// thread, no redundant creations.
#[tokio::test]
async fn session_establishment_is_idempotent() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::completes(&["first"]))
            .with_round(ScriptedRound::completes(&["second"])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("one").await;
    orchestrator.process_message("two").await;

    assert_eq!(client.created_assistants(), 1);
    assert_eq!(client.created_threads(), 1);
    assert_eq!(client.updated_assistants(), 0);
}

/// Session establishment failure surfaces the fixed failure message and
/// posts nothing.
#[tokio::test]
async fn session_failure_surfaces_fixed_message() {
    let client = Arc::new(MockAssistantClient::new().with_find_failure());
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("hello?").await;

    let last = sink.last_update().expect("final update");
    assert!(last.is_final);
    assert_eq!(last.text, SESSION_FAILURE_MESSAGE);
    assert!(client.posted_messages().is_empty());
}

/// A stale thread triggers one transparent re-establishment and retry.
#[tokio::test]
async fn stale_session_is_reestablished_once() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_stale_posts(1)
            .with_round(ScriptedRound::completes(&["recovered"])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator.process_message("still there?").await;

    assert_eq!(client.created_threads(), 2);
    assert_eq!(client.created_assistants(), 1);
    let posted = client.posted_messages();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "thread-2");
    assert_eq!(sink.last_update().expect("final").text, "recovered");
}

/// A run ending in a failure status finalizes with the partial text only.
#[tokio::test]
async fn failed_run_finalizes_partial_text() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::requires_action(
                &["Working on "],
                vec![tool_call("call-1", "histogram", "{}")],
            ))
            .with_round(ScriptedRound::terminates(RunStatus::Failed)),
    );
    let registry = ToolRegistry::new();
    registry.register(Arc::new(DummyTool::new("histogram")));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), registry, sink.clone());

    orchestrator.process_message("histogram").await;

    let last = sink.last_update().expect("final update");
    assert!(last.is_final);
    assert_eq!(last.text, "Working on ");
    assert!(last.payloads.is_empty());
}

/// Per-turn instructions are injected into the run start.
#[tokio::test]
async fn instruction_injection_reaches_the_run() {
    let client =
        Arc::new(MockAssistantClient::new().with_round(ScriptedRound::completes(&["ok"])));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator
        .process_message_with_instructions("map this", "dataset CRS is EPSG:4326")
        .await;

    assert_eq!(
        client.run_instructions(),
        vec![Some("dataset CRS is EPSG:4326".to_string())]
    );
}

/// The image turn streams a one-shot completion through the same sink
/// contract without tool-calling.
#[tokio::test]
async fn image_turn_streams_one_shot_completion() {
    let client = Arc::new(MockAssistantClient::new().with_vision_chunks(&["A choropleth ", "map"]));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    orchestrator
        .process_image("describe this", "data:image/png;base64,…")
        .await;

    let updates = sink.updates();
    let last = updates.last().expect("final update");
    assert!(last.is_final);
    assert_eq!(last.text, "A choropleth map");
    assert!(client.posted_messages().is_empty());
    assert!(client.ops().contains(&"stream_vision".to_string()));
}

/// The audio path returns the transcript for a subsequent text turn.
#[tokio::test]
async fn transcription_returns_text() {
    let client =
        Arc::new(MockAssistantClient::new().with_transcript("histogram of income with 7 bins"));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator(client.clone(), ToolRegistry::new(), sink.clone());

    let transcript = orchestrator.transcribe(vec![0u8; 16]).await.expect("transcript");
    assert_eq!(transcript, "histogram of income with 7 bins");
}

/// Rapid-fire turns are serialized FIFO by the turn mutex.
#[tokio::test]
async fn concurrent_turns_are_serialized() {
    let client = Arc::new(
        MockAssistantClient::new()
            .with_round(ScriptedRound::completes(&["first"]))
            .with_round(ScriptedRound::completes(&["second"])),
    );
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = Arc::new(orchestrator(client.clone(), ToolRegistry::new(), sink.clone()));

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_message("one").await })
    };
    let second = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_message("two").await })
    };
    first.await.expect("first turn");
    second.await.expect("second turn");

    // Both turns ran to completion without interleaving their posts and runs.
    let ops = client.ops();
    assert_eq!(ops.iter().filter(|op| *op == "post_message").count(), 2);
    assert_eq!(ops.iter().filter(|op| *op == "stream_run").count(), 2);
    let finals = sink
        .updates()
        .into_iter()
        .filter(|update| update.is_final)
        .count();
    assert_eq!(finals, 2);
}
