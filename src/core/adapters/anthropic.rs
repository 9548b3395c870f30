use async_trait::async_trait;

use super::{
    normalize_reply, post_json, ProviderAdapter, ProviderReply, ProviderRequest,
    COMPLETION_TEMPERATURE,
};
use crate::api::{AnthropicRequest, AnthropicResponse, ChatMessage};
use crate::core::config::DEFAULT_SYSTEM_PROMPT;
use crate::core::error::ChatError;
use crate::core::providers::WireProtocol;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub const ANTHROPIC_MAX_TOKENS: u32 = 1000;

/// Adapter for Anthropic's native `messages` endpoint.
pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    system_prompt: String,
    max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: construct_api_url(base_url, "messages"),
            api_key: api_key.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: ANTHROPIC_MAX_TOKENS,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Only user turns go into `messages`; the system prompt travels in its
    /// own field and assistant turns are not replayed.
    pub fn build_request(&self, request: &ProviderRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: request.wire_model_name.clone(),
            max_tokens: self.max_tokens,
            temperature: COMPLETION_TEMPERATURE,
            system: self.system_prompt.clone(),
            messages: request
                .history
                .iter()
                .filter(|message| message.is_user())
                .map(ChatMessage::from)
                .collect(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn protocol(&self) -> WireProtocol {
        WireProtocol::AnthropicNative
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderReply, ChatError> {
        let body = self.build_request(&request);
        let http_request = add_auth_headers(
            self.client.post(&self.endpoint),
            self.protocol(),
            Some(&self.api_key),
        );

        let response: AnthropicResponse = post_json(http_request, &body).await?;
        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        let content = (!texts.is_empty()).then(|| texts.concat());
        normalize_reply(content, "text content block")
    }
}
