//! Tool contract, registry, and batch dispatch for GeoAssist.
//!
//! Tools are the application-defined callables (histograms, spatial weights,
//! regression runs, …) the remote assistant asks for mid-run. This crate
//! owns their interface and the dispatcher that executes one requires-action
//! batch with per-call failure isolation.

mod context;
mod dispatcher;
mod registry;
mod tool;

pub use context::ToolContext;
pub use dispatcher::ToolDispatcher;
pub use registry::ToolRegistry;
pub use tool::Tool;
