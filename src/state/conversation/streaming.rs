use super::ConversationStreamUpdate;
use crate::tools::{AssembledToolCalls, ToolCallAssembler};
use crate::types::StreamEvent;
use tokio::sync::mpsc;

/// Running fold over one streamed reply: prose, reasoning and tool-call fragments.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    text: String,
    assembler: ToolCallAssembler,
    finish_reason: Option<String>,
    saw_reasoning: bool,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(
        &mut self,
        event: StreamEvent,
        stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
    ) {
        match event {
            StreamEvent::Text(text) => {
                self.text.push_str(&text);
                emit_stream_update(stream_delta_tx, ConversationStreamUpdate::Delta(text));
            }
            StreamEvent::Reasoning(text) => {
                // Shown to the user only; never stored in the conversation.
                self.saw_reasoning = true;
                emit_stream_update(stream_delta_tx, ConversationStreamUpdate::Reasoning(text));
            }
            StreamEvent::ToolFragment(fragment) => self.assembler.push(fragment),
            StreamEvent::Finished { reason } => self.finish_reason = Some(reason),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn saw_reasoning(&self) -> bool {
        self.saw_reasoning
    }

    pub fn finish(self) -> (String, AssembledToolCalls, Option<String>) {
        (self.text, self.assembler.finish(), self.finish_reason)
    }
}

pub(super) fn emit_stream_update(
    stream_delta_tx: Option<&mpsc::UnboundedSender<ConversationStreamUpdate>>,
    update: ConversationStreamUpdate,
) {
    if let Some(tx) = stream_delta_tx {
        let _ = tx.send(update);
    }
}
