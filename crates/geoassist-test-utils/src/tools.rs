//! Simple tool implementations for dispatcher and orchestrator tests.

use async_trait::async_trait;
use geoassist_protocol::{ToolError, ToolOutput, UiPayload};
use geoassist_tools::{Tool, ToolContext};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;

/// Tool returning a fixed result, optionally rendering it as a UI payload.
#[derive(Debug, Clone)]
pub struct DummyTool {
    name: String,
    description: String,
    properties: Value,
    result: Value,
    rendered: bool,
}

impl DummyTool {
    /// Create a tool with an empty schema and empty-object result.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "dummy".to_string(),
            properties: json!({}),
            result: json!({}),
            rendered: false,
        }
    }

    /// Override the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the argument schema properties.
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Override the fixed result.
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    /// Render the output into a UI payload on finalization.
    pub fn with_render(mut self) -> Self {
        self.rendered = true;
        self
    }
}

#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn properties(&self) -> Value {
        self.properties.clone()
    }

    async fn call(
        &self,
        _ctx: &ToolContext,
        _args: Value,
        _previous: &[ToolOutput],
    ) -> Result<Value, ToolError> {
        Ok(self.result.clone())
    }

    fn render(&self, _args: &Value, output: &Value) -> Option<UiPayload> {
        self.rendered.then(|| UiPayload {
            tool_name: self.name.clone(),
            data: output.clone(),
        })
    }
}

/// Tool whose callback always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingTool {
    name: String,
    message: String,
}

impl FailingTool {
    /// Create a failing tool.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn properties(&self) -> Value {
        json!({})
    }

    async fn call(
        &self,
        _ctx: &ToolContext,
        _args: Value,
        _previous: &[ToolOutput],
    ) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionFailed(self.message.clone()))
    }
}

/// Tool recording the arguments and previous outputs of every invocation.
#[derive(Debug, Clone)]
pub struct RecordingTool {
    name: String,
    seen: Arc<Mutex<Vec<(Value, Vec<ToolOutput>)>>>,
}

impl RecordingTool {
    /// Create a recording tool and the handle its invocations land in.
    pub fn new(name: impl Into<String>) -> (Self, Arc<Mutex<Vec<(Value, Vec<ToolOutput>)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name: name.into(),
                seen: seen.clone(),
            },
            seen,
        )
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records invocations"
    }

    fn properties(&self) -> Value {
        json!({})
    }

    async fn call(
        &self,
        _ctx: &ToolContext,
        args: Value,
        previous: &[ToolOutput],
    ) -> Result<Value, ToolError> {
        self.seen.lock().push((args, previous.to_vec()));
        Ok(json!({ "previous_outputs": previous.len() }))
    }
}
