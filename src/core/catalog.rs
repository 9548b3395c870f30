//! Model catalog
//!
//! Maps user-facing model ids to the provider that serves them and the
//! model name that provider expects on the wire. Built-in entries are
//! embedded from `builtin_models.toml` at compile time; user entries from
//! the config file are merged in once at construction.

use serde::Deserialize;

use crate::core::config::CustomModel;
use crate::core::error::ChatError;
use crate::core::providers::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: ProviderKind,
    pub wire_model_name: String,
}

#[derive(Debug, Deserialize)]
struct BuiltinModelsConfig {
    default_model: String,
    models: Vec<ModelDescriptor>,
}

fn load_builtin_models() -> BuiltinModelsConfig {
    const CONFIG_CONTENT: &str = include_str!("builtin_models.toml");

    toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_models.toml")
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    default_model: String,
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        let builtin = load_builtin_models();
        Self {
            models: builtin.models,
            default_model: builtin.default_model,
        }
    }

    /// Built-in models plus `custom` entries. A custom entry whose id matches a
    /// built-in replaces it in place; new ids are appended in order.
    pub fn with_custom_models(custom: &[CustomModel]) -> Self {
        let mut catalog = Self::builtin();
        for model in custom {
            let descriptor = ModelDescriptor {
                id: model.id.trim().to_string(),
                provider: model.provider,
                wire_model_name: model.wire_model_name.clone(),
            };
            if descriptor.id.is_empty() {
                continue;
            }
            match catalog.position(&descriptor.id) {
                Some(index) => catalog.models[index] = descriptor,
                None => catalog.models.push(descriptor),
            }
        }
        catalog
    }

    fn position(&self, model_id: &str) -> Option<usize> {
        self.models.iter().position(|m| m.id == model_id)
    }

    pub fn resolve(&self, model_id: &str) -> Result<&ModelDescriptor, ChatError> {
        self.position(model_id.trim())
            .map(|index| &self.models[index])
            .ok_or_else(|| ChatError::UnknownModel(model_id.to_string()))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.resolve(model_id).is_ok()
    }

    pub fn list_ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Pick the startup model: `preferred` when it resolves, otherwise the
    /// catalog default.
    pub fn initial_selection(&self, preferred: Option<&str>) -> String {
        preferred
            .filter(|id| self.contains(id))
            .unwrap_or(&self.default_model)
            .trim()
            .to_string()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
