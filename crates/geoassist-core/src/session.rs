//! Lifecycle of the process-wide remote session.

use crate::config::AssistantConfig;
use crate::error::GeoAssistError;
use geoassist_protocol::{AssistantClient, AssistantDescriptor, AssistantSpec, ThreadId};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Cached remote handles; each slot heals independently.
#[derive(Default)]
struct SessionSlots {
    assistant: Option<AssistantDescriptor>,
    thread: Option<ThreadId>,
}

/// Snapshot of an established session, valid for one turn.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Assistant descriptor to run against.
    pub assistant: AssistantDescriptor,
    /// Conversation thread to post to.
    pub thread: ThreadId,
}

/// Owns the remote session handles: assistant descriptor and thread.
///
/// At most one session exists per manager. Handles are created lazily on
/// first use and re-created transparently when missing, which makes
/// `ensure` safe to invoke on every message as a self-healing step.
/// Turn-level mutual exclusion is the orchestrator's mutex; this lock only
/// guards slot reads and writes.
pub struct SessionManager {
    client: Arc<dyn AssistantClient>,
    config: AssistantConfig,
    tool_specs: Vec<Value>,
    slots: RwLock<SessionSlots>,
}

impl SessionManager {
    /// Create a manager over the given client and configuration.
    pub fn new(
        client: Arc<dyn AssistantClient>,
        config: AssistantConfig,
        tool_specs: Vec<Value>,
    ) -> Self {
        Self {
            client,
            config,
            tool_specs,
            slots: RwLock::new(SessionSlots::default()),
        }
    }

    /// Borrow the remote client handle.
    pub fn client(&self) -> &Arc<dyn AssistantClient> {
        &self.client
    }

    /// Idempotently establish the session and return a handle snapshot.
    ///
    /// Three independent checks, each skipped when already satisfied: the
    /// assistant descriptor is looked up by name and created if absent or
    /// updated in place when its stored version tag differs from ours; the
    /// thread is created if absent. Repeated calls with unchanged inputs
    /// perform no redundant remote creation.
    pub async fn ensure(&self) -> Result<SessionHandle, GeoAssistError> {
        // Clone the slots out before awaiting; the guard must not be held
        // across a suspension point.
        let cached_assistant = self.slots.read().assistant.clone();
        let assistant = match cached_assistant {
            Some(assistant) => assistant,
            None => {
                let assistant = self.resolve_assistant().await?;
                self.slots.write().assistant = Some(assistant.clone());
                assistant
            }
        };

        let cached_thread = self.slots.read().thread.clone();
        let thread = match cached_thread {
            Some(thread) => thread,
            None => {
                let thread = self.client.create_thread().await?;
                info!("created thread (thread_id={})", thread);
                self.slots.write().thread = Some(thread.clone());
                thread
            }
        };

        Ok(SessionHandle { assistant, thread })
    }

    /// Drop cached handles so the next `ensure` rebuilds them from scratch.
    pub fn invalidate(&self) {
        debug!("invalidating session handles");
        let mut slots = self.slots.write();
        slots.assistant = None;
        slots.thread = None;
    }

    /// Best-effort cancel of every non-terminal run on the thread.
    ///
    /// Cancellation failures are swallowed since the run may already be
    /// terminal, but each one is logged for observability.
    pub async fn cancel_active_runs(&self, thread: &ThreadId) {
        let runs = match self.client.list_active_runs(thread).await {
            Ok(runs) => runs,
            Err(err) => {
                warn!("failed to list active runs (thread_id={}): {}", thread, err);
                return;
            }
        };
        for run in runs {
            info!("cancelling active run (thread_id={}, run_id={})", thread, run);
            if let Err(err) = self.client.cancel_run(thread, &run).await {
                warn!(
                    "failed to cancel run (thread_id={}, run_id={}): {}",
                    thread, run, err
                );
            }
        }
    }

    /// Tear the session down: cancel active runs, delete the thread, clear
    /// the cached handles. The assistant schema itself is left in place.
    pub async fn teardown(&self) {
        let thread = self.slots.read().thread.clone();
        if let Some(thread) = thread {
            self.cancel_active_runs(&thread).await;
            info!("deleting thread (thread_id={})", thread);
            if let Err(err) = self.client.delete_thread(&thread).await {
                warn!("failed to delete thread (thread_id={}): {}", thread, err);
            }
        }
        self.invalidate();
    }

    /// Resolve the assistant descriptor remotely: find by name, create when
    /// absent, update in place on version drift.
    async fn resolve_assistant(&self) -> Result<AssistantDescriptor, GeoAssistError> {
        let spec = self.assistant_spec();
        match self.client.find_assistant(&self.config.name).await? {
            Some(existing) if existing.version == self.config.version => {
                debug!(
                    "reusing assistant (assistant_id={}, version={})",
                    existing.id, existing.version
                );
                Ok(existing)
            }
            Some(existing) => {
                info!(
                    "upgrading assistant (assistant_id={}, from={}, to={})",
                    existing.id, existing.version, self.config.version
                );
                Ok(self.client.update_assistant(&existing.id, &spec).await?)
            }
            None => {
                let created = self.client.create_assistant(&spec).await?;
                info!(
                    "created assistant (assistant_id={}, name={}, tools={})",
                    created.id,
                    created.name,
                    spec.tools.len()
                );
                Ok(created)
            }
        }
    }

    fn assistant_spec(&self) -> AssistantSpec {
        AssistantSpec {
            name: self.config.name.clone(),
            instructions: self.config.instructions.clone(),
            model: self.config.model.clone(),
            version: self.config.version.clone(),
            tools: self.tool_specs.clone(),
        }
    }
}
