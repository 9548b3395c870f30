//! Authentication headers for provider requests.

use crate::core::providers::WireProtocol;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Add protocol-specific authentication headers to an HTTP request
///
/// - Anthropic: `x-api-key` plus the pinned `anthropic-version`
/// - OpenAI-compatible: standard `Authorization: Bearer`
/// - Local daemon: none; `api_key` is ignored
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    protocol: WireProtocol,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match (protocol, api_key) {
        (WireProtocol::LocalChat, _) | (_, None) => request,
        (WireProtocol::AnthropicNative, Some(key)) => request
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION),
        (WireProtocol::OpenAiCompatible, Some(key)) => request.bearer_auth(key),
    }
}
