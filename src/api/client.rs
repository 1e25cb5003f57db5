use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::tools::schema::tool_definitions;
use crate::types::ChatMessage;
use crate::util::is_local_endpoint_url;
use anyhow::anyhow;
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, messages: &[ChatMessage]) -> Result<ByteStream>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
    max_tokens: u32,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            max_tokens: config.max_tokens,
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: None,
            model: "mock-model".to_string(),
            api_url: "http://localhost:8000/v1/chat/completions".to_string(),
            max_tokens: 1024,
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    pub async fn create_stream(&self, messages: &[ChatMessage]) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(messages);
            }
        }

        let request_url = self.request_url();
        let payload = self.build_payload(messages);

        let mut request = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .json(&payload);

        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &payload);
        }

        if let Some(api_key) = &self.api_key {
            request = request.header("authorization", format!("Bearer {api_key}"));
        }

        tracing::debug!(url = %request_url, messages = messages.len(), "opening chat stream");

        let response = request
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    fn build_payload(&self, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "tools": tool_definitions(),
            "tool_choice": "auto",
            "stream": true,
            "max_tokens": self.max_tokens,
        })
    }

    fn request_url(&self) -> String {
        adapt_to_chat_completions_url(&self.api_url)
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local API endpoint '{}': {}. Start your local server or update DEEPSEEK_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach API endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("API request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "API endpoint '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("API request to '{}' failed: {}", request_url, error)
}

fn adapt_to_chat_completions_url(api_url: &str) -> String {
    let normalized = api_url.trim().trim_end_matches('/');
    if normalized.ends_with("/chat/completions") {
        return normalized.to_string();
    }
    if normalized.ends_with("/v1") {
        return format!("{normalized}/chat/completions");
    }

    // A bare origin such as https://api.deepseek.com has no path segments.
    let without_scheme = normalized
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(normalized);
    if !without_scheme.contains('/') {
        return format!("{normalized}/chat/completions");
    }
    normalized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_url: &str) -> Config {
        Config {
            api_key: Some("test-key".to_string()),
            model: "deepseek-chat".to_string(),
            api_url: api_url.to_string(),
            max_tokens: 2048,
            max_history_messages: 50,
            max_context_files: 5,
            skip_staging: false,
            working_dir: std::path::PathBuf::from("."),
        }
    }

    #[test]
    fn test_url_adapter_keeps_full_endpoint() {
        let adapted = adapt_to_chat_completions_url("https://api.deepseek.com/chat/completions/");
        assert_eq!(adapted, "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn test_url_adapter_from_v1_base_endpoint() {
        let adapted = adapt_to_chat_completions_url("http://localhost:8000/v1");
        assert_eq!(adapted, "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_url_adapter_from_bare_origin() {
        let adapted = adapt_to_chat_completions_url("https://api.deepseek.com");
        assert_eq!(adapted, "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn test_payload_carries_tools_and_streaming_flags() {
        let client = ApiClient::new(&test_config("https://api.deepseek.com/chat/completions"))
            .expect("client should build");
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: Some("hello".to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }];

        let payload = client.build_payload(&messages);
        assert_eq!(payload["model"], "deepseek-chat");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["max_tokens"], 2048);
        assert_eq!(payload["messages"][0]["content"], "hello");
        assert_eq!(
            payload["tools"].as_array().map(Vec::len),
            Some(crate::tools::schema::TOOL_NAMES.len())
        );
    }

    #[test]
    fn test_local_endpoint_detection_follows_config_url() {
        let local = ApiClient::new(&test_config("http://127.0.0.1:8080/v1")).expect("client");
        assert!(local.is_local_endpoint());
        let remote = ApiClient::new(&test_config("https://api.deepseek.com")).expect("client");
        assert!(!remote.is_local_endpoint());
    }
}
