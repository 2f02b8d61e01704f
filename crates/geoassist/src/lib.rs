//! Public SDK surface for GeoAssist.
//!
//! This crate re-exports the orchestration building blocks and provides a
//! small initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use geoassist_core as core;
/// Re-export for convenience.
pub use geoassist_protocol as protocol;
/// Re-export for convenience.
pub use geoassist_tools as tools;

pub use geoassist_core::{AssistantConfig, Orchestrator, SESSION_FAILURE_MESSAGE};
pub use geoassist_protocol::{AssistantClient, StreamSink};
pub use geoassist_tools::{Tool, ToolContext, ToolRegistry};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
