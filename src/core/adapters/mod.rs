//! Provider adapters
//!
//! One [`ProviderAdapter`] per wire protocol turns the normalized message
//! history into exactly one outbound request and normalizes the reply.
//! Adapters hold no conversation state; a failed call leaves nothing behind.

mod anthropic;
mod local;
mod openai;


use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::core::catalog::ModelDescriptor;
use crate::core::config::Config;
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::providers::{
    require_api_key, CredentialSource, LayeredCredentials, ProviderEndpoints, WireProtocol,
};

pub use anthropic::{AnthropicAdapter, ANTHROPIC_MAX_TOKENS};
pub use local::LocalChatAdapter;
pub use openai::OpenAiCompatibleAdapter;

const COMPLETION_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub wire_model_name: String,
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub content: String,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn protocol(&self) -> WireProtocol;

    /// Issue one completion request. No retries.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderReply, ChatError>;
}

/// Hands out the adapter that serves a catalog entry.
///
/// Credentials are resolved here, at call time, so a missing key fails the
/// turn with `MissingCredential` instead of failing startup.
pub trait AdapterSource: Send + Sync {
    fn adapter_for(&self, model: &ModelDescriptor) -> Result<Arc<dyn ProviderAdapter>, ChatError>;
}

/// Builds HTTP adapters against real provider endpoints.
pub struct HttpAdapterSource {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
    credentials: Arc<dyn CredentialSource>,
    system_prompt: String,
}

impl HttpAdapterSource {
    pub fn new(
        client: reqwest::Client,
        endpoints: ProviderEndpoints,
        credentials: Arc<dyn CredentialSource>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoints,
            credentials,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::new(
            builder.build()?,
            ProviderEndpoints::from_config(config),
            Arc::new(LayeredCredentials::from_config(config)),
            config.system_prompt(),
        ))
    }
}

impl AdapterSource for HttpAdapterSource {
    fn adapter_for(&self, model: &ModelDescriptor) -> Result<Arc<dyn ProviderAdapter>, ChatError> {
        let provider = model.provider;
        let api_key = require_api_key(self.credentials.as_ref(), provider)?;
        let base_url = self.endpoints.base_url(provider);
        debug!(model = %model.id, %provider, %base_url, "Selected provider adapter");

        let adapter: Arc<dyn ProviderAdapter> = match (provider.protocol(), api_key) {
            (WireProtocol::OpenAiCompatible, Some(api_key)) => Arc::new(
                OpenAiCompatibleAdapter::new(self.client.clone(), &base_url, api_key)
                    .with_system_prompt(&self.system_prompt),
            ),
            (WireProtocol::AnthropicNative, Some(api_key)) => Arc::new(
                AnthropicAdapter::new(self.client.clone(), &base_url, api_key)
                    .with_system_prompt(&self.system_prompt),
            ),
            (WireProtocol::LocalChat, _) => {
                Arc::new(LocalChatAdapter::new(self.client.clone(), &base_url))
            }
            (_, None) => {
                return Err(ChatError::MissingCredential {
                    provider: provider.id().to_string(),
                    env_var: provider.api_key_env_var().unwrap_or_default().to_string(),
                })
            }
        };
        Ok(adapter)
    }
}

/// POST `body` and decode a 2xx JSON response into `R`.
///
/// Non-2xx responses keep the raw body text; transport failures and
/// undecodable bodies map to their own categories.
async fn post_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R, ChatError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|err| ChatError::transport(&err))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(status = status.as_u16(), "Provider rejected request");
        return Err(ChatError::Provider {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ChatError::transport(&err))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ChatError::Protocol(format!("could not decode response body: {err}")))
}

fn normalize_reply(content: Option<String>, field: &str) -> Result<ProviderReply, ChatError> {
    content
        .map(|text| ProviderReply {
            content: text.trim().to_string(),
        })
        .ok_or_else(|| ChatError::Protocol(format!("response has no {field}")))
}
