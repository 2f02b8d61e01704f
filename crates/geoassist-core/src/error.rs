//! Error types for the orchestration core.

use geoassist_protocol::ClientError;
use thiserror::Error;

/// Errors produced by orchestration operations.
///
/// Nothing below the orchestrator lets one of these escape to the caller of
/// a message path; they resolve to structured outputs or a user-visible
/// terminal message.
#[derive(Debug, Error)]
pub enum GeoAssistError {
    /// Remote service failure.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// Session could not be established or re-established.
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
    /// Run stream ended without resolving to an outcome.
    #[error("run stream error: {0}")]
    Stream(String),
}
