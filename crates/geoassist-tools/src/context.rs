//! Opaque execution context injected into every tool call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased bag of application state (dataset accessors, query function,
/// weights cache, …) passed to every tool callback unchanged.
///
/// The orchestration core never inspects its contents; tools downcast to
/// whatever state type the application registered.
#[derive(Clone, Default)]
pub struct ToolContext {
    state: Option<Arc<dyn Any + Send + Sync>>,
}

impl ToolContext {
    /// Create a context carrying the given application state.
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self {
            state: Some(Arc::new(state)),
        }
    }

    /// Create a context with no application state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Downcast the carried state to a concrete type.
    pub fn state<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state.as_deref().and_then(|state| state.downcast_ref())
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("has_state", &self.state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ToolContext;
    use pretty_assertions::assert_eq;

    struct Workbench {
        dataset: &'static str,
    }

    #[test]
    fn context_downcasts_registered_state() {
        let ctx = ToolContext::new(Workbench { dataset: "natregimes" });
        assert_eq!(ctx.state::<Workbench>().expect("state").dataset, "natregimes");
        assert!(ctx.state::<String>().is_none());
    }

    #[test]
    fn empty_context_has_no_state() {
        let ctx = ToolContext::empty();
        assert!(ctx.state::<Workbench>().is_none());
    }
}
