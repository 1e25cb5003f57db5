use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::ChatMessage;
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Frames starting with this prefix become a transport error carrying the rest of the line.
pub const MOCK_TRANSPORT_ERROR: &str = "!error ";

/// Replays scripted SSE frames, one script per `create_stream` call.
#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Message lists received so far, one per request.
    pub fn recorded_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, messages: &[ChatMessage]) -> Result<ByteStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        let mut responses_guard = self
            .responses
            .lock()
            .map_err(|_| anyhow::anyhow!("MockApiClient: response lock poisoned"))?;
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!(
                "MockApiClient: No more responses configured"
            ));
        }
        let current_sse_chunks = responses_guard.remove(0);

        let sse_byte_chunks: Vec<Result<Bytes>> = current_sse_chunks
            .into_iter()
            .map(|s| {
                if let Some(reason) = s.strip_prefix(MOCK_TRANSPORT_ERROR) {
                    return Err(anyhow::anyhow!("{reason}"));
                }
                let framed = if s.ends_with("\n\n") {
                    s
                } else {
                    format!("{s}\n\n")
                };
                Ok(Bytes::from(framed))
            })
            .collect();

        Ok(Box::pin(stream::iter(sse_byte_chunks)))
    }
}
