//! Provider identities, endpoints and credential lookup.
//!
//! Every model in the catalog is served by one [`ProviderKind`]. A kind
//! knows which wire protocol it speaks, where its API lives by default and
//! which environment variables configure it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::error::ChatError;
use crate::core::keyring::{KeyringAccessError, KeyringCredentials};
use crate::utils::url::normalize_base_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    OpenRouter,
    Local,
}

/// The request/response shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    OpenAiCompatible,
    AnthropicNative,
    LocalChat,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::OpenRouter,
        ProviderKind::Local,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Local => "local",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::Local => "Local daemon",
        }
    }

    /// Find a provider by id (case-insensitive).
    pub fn from_id(id: &str) -> Option<ProviderKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id.trim()))
    }

    pub fn protocol(self) -> WireProtocol {
        match self {
            ProviderKind::OpenAi | ProviderKind::OpenRouter => WireProtocol::OpenAiCompatible,
            ProviderKind::Anthropic => WireProtocol::AnthropicNative,
            ProviderKind::Local => WireProtocol::LocalChat,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Local => "http://127.0.0.1:11434",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderKind::Local => None,
        }
    }

    pub fn base_url_env_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_BASE_URL",
            ProviderKind::Anthropic => "ANTHROPIC_BASE_URL",
            ProviderKind::OpenRouter => "OPENROUTER_BASE_URL",
            ProviderKind::Local => "PALAVER_LOCAL_BASE_URL",
        }
    }

    pub fn requires_credential(self) -> bool {
        self.api_key_env_var().is_some()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Base URLs for every provider after applying config and environment
/// overrides (environment wins).
#[derive(Debug, Clone, Default)]
pub struct ProviderEndpoints {
    overrides: HashMap<ProviderKind, String>,
}

impl ProviderEndpoints {
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    pub fn from_config_with_env<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = HashMap::new();
        for kind in ProviderKind::ALL {
            if let Some(base_url) = config.provider_base_url(kind) {
                overrides.insert(kind, normalize_base_url(base_url));
            }
            if let Some(base_url) = lookup(kind.base_url_env_var()).filter(|v| !v.trim().is_empty())
            {
                overrides.insert(kind, normalize_base_url(base_url.trim()));
            }
        }
        Self { overrides }
    }

    pub fn with_base_url(mut self, kind: ProviderKind, base_url: impl AsRef<str>) -> Self {
        self.overrides
            .insert(kind, normalize_base_url(base_url.as_ref()));
        self
    }

    pub fn base_url(&self, kind: ProviderKind) -> String {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_base_url().to_string())
    }
}

/// Somewhere API keys can be looked up.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self, provider: ProviderKind) -> Result<Option<String>, KeyringAccessError>;
}

/// Reads API keys from environment variables.
pub struct EnvCredentials {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: ProviderKind) -> Result<Option<String>, KeyringAccessError> {
        Ok(provider
            .api_key_env_var()
            .and_then(|name| (self.lookup)(name))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}

/// Environment first, then (optionally) the platform keyring.
///
/// Keyring failures never abort a turn: they are logged and treated as
/// "no key stored", which surfaces as `MissingCredential` further up.
pub struct LayeredCredentials {
    env: EnvCredentials,
    keyring: Option<KeyringCredentials>,
}

impl LayeredCredentials {
    pub fn new(use_keyring: bool) -> Self {
        Self {
            env: EnvCredentials::new(),
            keyring: use_keyring.then_some(KeyringCredentials),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.use_keyring.unwrap_or(true))
    }
}

impl CredentialSource for LayeredCredentials {
    fn api_key(&self, provider: ProviderKind) -> Result<Option<String>, KeyringAccessError> {
        if let Some(key) = self.env.api_key(provider)? {
            debug!(provider = provider.id(), "Using API key from environment");
            return Ok(Some(key));
        }

        let Some(keyring) = &self.keyring else {
            return Ok(None);
        };

        match keyring.api_key(provider) {
            Ok(key) => Ok(key),
            Err(err) if err.is_recoverable() => {
                warn!(
                    provider = provider.id(),
                    error = %err,
                    "Keyring temporarily unavailable; continuing without stored credentials"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Look up the key for `provider`, failing with `MissingCredential` when the
/// provider needs one and none is available.
pub fn require_api_key(
    source: &dyn CredentialSource,
    provider: ProviderKind,
) -> Result<Option<String>, ChatError> {
    let Some(env_var) = provider.api_key_env_var() else {
        return Ok(None);
    };

    let missing = || ChatError::MissingCredential {
        provider: provider.id().to_string(),
        env_var: env_var.to_string(),
    };

    match source.api_key(provider) {
        Ok(Some(key)) => Ok(Some(key)),
        Ok(None) => Err(missing()),
        Err(err) => {
            warn!(provider = provider.id(), error = %err, "Keyring lookup failed");
            Err(missing())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::data::ProviderOverride;
    use crate::utils::test_utils::TestEnvVarGuard;
    use std::io;

    struct FailingSource {
        recoverable: bool,
    }

    impl CredentialSource for FailingSource {
        fn api_key(&self, _provider: ProviderKind) -> Result<Option<String>, KeyringAccessError> {
            let err = if self.recoverable {
                keyring::Error::NoStorageAccess(Box::new(io::Error::other("locked")))
            } else {
                keyring::Error::BadEncoding(Vec::new())
            };
            Err(KeyringAccessError::from(err))
        }
    }

    #[test]
    fn provider_ids_round_trip_case_insensitively() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ProviderKind::from_id("OpenRouter"), Some(ProviderKind::OpenRouter));
        assert_eq!(ProviderKind::from_id("nonexistent"), None);
    }

    #[test]
    fn aggregator_speaks_openai_protocol() {
        assert_eq!(
            ProviderKind::OpenRouter.protocol(),
            WireProtocol::OpenAiCompatible
        );
        assert_eq!(
            ProviderKind::Anthropic.protocol(),
            WireProtocol::AnthropicNative
        );
        assert_eq!(ProviderKind::Local.protocol(), WireProtocol::LocalChat);
    }

    #[test]
    fn env_base_url_overrides_config() {
        let mut config = Config::default();
        config.providers.insert(
            "openai".to_string(),
            ProviderOverride {
                base_url: Some("https://config.example/v1/".to_string()),
            },
        );

        let endpoints = ProviderEndpoints::from_config_with_env(&config, |_| None);
        assert_eq!(
            endpoints.base_url(ProviderKind::OpenAi),
            "https://config.example/v1"
        );

        let endpoints = ProviderEndpoints::from_config_with_env(&config, |name| {
            (name == "OPENAI_BASE_URL").then(|| "https://env.example/v1".to_string())
        });
        assert_eq!(
            endpoints.base_url(ProviderKind::OpenAi),
            "https://env.example/v1"
        );
        assert_eq!(
            endpoints.base_url(ProviderKind::Local),
            "http://127.0.0.1:11434"
        );
    }

    #[test]
    fn local_provider_needs_no_key() {
        let source = EnvCredentials::with_lookup(|_| None);
        assert_eq!(require_api_key(&source, ProviderKind::Local), Ok(None));
    }

    #[test]
    fn absent_key_is_missing_credential() {
        let source = EnvCredentials::with_lookup(|_| None);
        let err = require_api_key(&source, ProviderKind::Anthropic).unwrap_err();
        assert_eq!(
            err,
            ChatError::MissingCredential {
                provider: "anthropic".to_string(),
                env_var: "ANTHROPIC_API_KEY".to_string(),
            }
        );
    }

    #[test]
    fn blank_env_values_count_as_missing() {
        let source = EnvCredentials::with_lookup(|_| Some("   ".to_string()));
        assert!(matches!(
            require_api_key(&source, ProviderKind::OpenAi),
            Err(ChatError::MissingCredential { .. })
        ));
    }

    #[test]
    fn keyring_failures_become_missing_credential() {
        for recoverable in [true, false] {
            let source = FailingSource { recoverable };
            assert!(matches!(
                require_api_key(&source, ProviderKind::OpenRouter),
                Err(ChatError::MissingCredential { .. })
            ));
        }
    }

    #[test]
    fn layered_credentials_prefer_environment() {
        let mut env_guard = TestEnvVarGuard::new();
        env_guard.set_var("OPENROUTER_API_KEY", "sk-or-env");

        let source = LayeredCredentials::new(false);
        assert_eq!(
            source.api_key(ProviderKind::OpenRouter).unwrap().as_deref(),
            Some("sk-or-env")
        );

        env_guard.remove_var("OPENROUTER_API_KEY");
        assert_eq!(source.api_key(ProviderKind::OpenRouter).unwrap(), None);
    }
}
