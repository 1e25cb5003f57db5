use serde::{Deserialize, Serialize};

/// One message of an OpenAI-compatible chat-completions request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    pub arguments: String,
}

impl WireToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: WireFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A single `data:` payload of the streamed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// A streamed piece of one tool call, keyed by its position in the pending call list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialToolCallFragment {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl From<ToolCallDelta> for PartialToolCallFragment {
    fn from(delta: ToolCallDelta) -> Self {
        let function = delta.function.unwrap_or_default();
        Self {
            index: delta.index,
            id: delta.id,
            name: function.name,
            arguments: function.arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Text(String),
    Reasoning(String),
    ToolFragment(PartialToolCallFragment),
    Finished { reason: String },
}

impl ChatChunk {
    /// Flatten the first choice of a chunk into stream events, in wire order.
    pub fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let Some(choice) = self.choices.into_iter().next() else {
            return events;
        };

        if let Some(reasoning) = choice.delta.reasoning_content.filter(|r| !r.is_empty()) {
            events.push(StreamEvent::Reasoning(reasoning));
        }
        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            events.push(StreamEvent::Text(text));
        }
        for delta in choice.delta.tool_calls.unwrap_or_default() {
            events.push(StreamEvent::ToolFragment(delta.into()));
        }
        if let Some(reason) = choice.finish_reason {
            events.push(StreamEvent::Finished { reason });
        }
        events
    }
}
