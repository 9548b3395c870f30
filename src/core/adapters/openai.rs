use async_trait::async_trait;

use super::{
    normalize_reply, post_json, ProviderAdapter, ProviderReply, ProviderRequest,
    COMPLETION_TEMPERATURE,
};
use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::config::DEFAULT_SYSTEM_PROMPT;
use crate::core::error::ChatError;
use crate::core::providers::WireProtocol;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// `chat/completions` adapter for OpenAI and OpenAI-compatible aggregators.
pub struct OpenAiCompatibleAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    system_prompt: String,
}

impl OpenAiCompatibleAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: construct_api_url(base_url, "chat/completions"),
            api_key: api_key.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// The system prompt leads, then the full history in order.
    pub fn build_request(&self, request: &ProviderRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 1);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(request.history.iter().map(ChatMessage::from));

        ChatRequest {
            model: request.wire_model_name.clone(),
            temperature: COMPLETION_TEMPERATURE,
            messages,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn protocol(&self) -> WireProtocol {
        WireProtocol::OpenAiCompatible
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderReply, ChatError> {
        let body = self.build_request(&request);
        let http_request = add_auth_headers(
            self.client.post(&self.endpoint),
            self.protocol(),
            Some(&self.api_key),
        );

        let response: ChatResponse = post_json(http_request, &body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        normalize_reply(content, "choices[0].message.content")
    }
}
