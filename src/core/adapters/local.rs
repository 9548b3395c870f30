use async_trait::async_trait;

use super::{normalize_reply, post_json, ProviderAdapter, ProviderReply, ProviderRequest};
use crate::api::{ChatMessage, LocalChatRequest, LocalChatResponse};
use crate::core::error::ChatError;
use crate::core::providers::WireProtocol;
use crate::utils::url::construct_api_url;

/// Adapter for a local inference daemon speaking the `api/chat` protocol.
pub struct LocalChatAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl LocalChatAdapter {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: construct_api_url(base_url, "api/chat"),
        }
    }

    pub fn build_request(&self, request: &ProviderRequest) -> LocalChatRequest {
        LocalChatRequest {
            model: request.wire_model_name.clone(),
            messages: request.history.iter().map(ChatMessage::from).collect(),
            stream: false,
        }
    }
}

#[async_trait]
impl ProviderAdapter for LocalChatAdapter {
    fn protocol(&self) -> WireProtocol {
        WireProtocol::LocalChat
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderReply, ChatError> {
        let body = self.build_request(&request);
        let response: LocalChatResponse = post_json(self.client.post(&self.endpoint), &body).await?;
        normalize_reply(Some(response.message.content), "message.content")
    }
}
