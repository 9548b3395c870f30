use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::providers::ProviderKind;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant!";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProviderOverride {
    pub base_url: Option<String>,
}

/// A user-defined catalog entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CustomModel {
    pub id: String,
    pub provider: ProviderKind,
    pub wire_model_name: String,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Model selected when the app starts
    pub default_model: Option<String>,
    /// System prompt for providers that take one (OpenAI-compatible, Anthropic)
    pub system_prompt: Option<String>,
    /// Where the conversation log lives; defaults to the platform data dir
    pub history_path: Option<PathBuf>,
    /// Transport timeout applied to every provider request
    pub request_timeout_secs: Option<u64>,
    /// Fall back to the OS keyring when no API key is in the environment
    pub use_keyring: Option<bool>,
    /// Per-provider overrides, keyed by provider id (e.g. "openrouter")
    #[serde(default)]
    pub providers: HashMap<String, ProviderOverride>,
    /// Additional models appended to the built-in catalog
    #[serde(default)]
    pub models: Vec<CustomModel>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn provider_base_url(&self, kind: ProviderKind) -> Option<&str> {
        self.providers
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(kind.id()))
            .and_then(|(_, entry)| entry.base_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn set_provider_base_url(&mut self, kind: ProviderKind, base_url: impl Into<String>) {
        self.clear_provider_base_url(kind);
        self.providers.insert(
            kind.id().to_string(),
            ProviderOverride {
                base_url: Some(base_url.into()),
            },
        );
    }

    /// Drops the override for `kind`. Returns false when none was set.
    pub fn clear_provider_base_url(&mut self, kind: ProviderKind) -> bool {
        let before = self.providers.len();
        self.providers
            .retain(|id, _| !id.eq_ignore_ascii_case(kind.id()));
        self.providers.len() != before
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
