//! Configuration for session establishment.

use serde::{Deserialize, Serialize};

/// Settings supplied once at session-establishment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// API credential passed through to the remote client.
    pub api_key: String,
    /// Assistant name used for remote descriptor lookup.
    pub name: String,
    /// System instructions for the assistant.
    pub instructions: String,
    /// Model identifier under the remote provider.
    pub model: String,
    /// Version tag; a mismatch with the remote descriptor triggers an
    /// in-place update rather than a new assistant.
    pub version: String,
}

impl AssistantConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::new()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            name: "geoassist".to_string(),
            instructions: String::new(),
            model: "gpt-4o".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Builder for assembling an `AssistantConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: AssistantConfig::default(),
        }
    }

    /// Set the API credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    /// Set the assistant name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the assistant system instructions.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = instructions.into();
        self
    }

    /// Set the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the assistant version tag.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Finalize and return the built `AssistantConfig`.
    pub fn build(self) -> AssistantConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::AssistantConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_overrides_defaults() {
        let config = AssistantConfig::builder()
            .api_key("sk-test")
            .name("workbench-assistant")
            .version("2.1.0")
            .build();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.name, "workbench-assistant");
        assert_eq!(config.version, "2.1.0");
        assert_eq!(config.model, "gpt-4o");
    }
}
