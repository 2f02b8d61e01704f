//! Shared test doubles for GeoAssist crates: a scripted assistant client,
//! a recording stream sink, and simple tool implementations.

mod client;
mod sink;
mod tools;

pub use client::{MockAssistantClient, ScriptedRound};
pub use sink::RecordingSink;
pub use tools::{DummyTool, FailingTool, RecordingTool};
