//! Orchestration core for the GeoAssist chat assistant.
//!
//! Owns the remote session lifecycle, the run-event loop, streaming
//! aggregation, and the mutex-serialized `Orchestrator` entry point that
//! drives one user turn end to end.

mod config;
mod error;
mod orchestrator;
mod run;
mod session;
mod stream;

pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use error::GeoAssistError;
pub use orchestrator::{Orchestrator, SESSION_FAILURE_MESSAGE};
pub use session::{SessionHandle, SessionManager};
pub use stream::StreamAggregator;
