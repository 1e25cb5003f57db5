use super::invocation::ToolInvocation;
use crate::error::AssemblyIssue;
pub use crate::types::PartialToolCallFragment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// A call that failed validation at end of stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedToolCall {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub issue: AssemblyIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledToolCalls {
    pub invocations: Vec<ToolInvocation>,
    pub dropped: Vec<DroppedToolCall>,
}

/// Folds streamed tool-call fragments into complete invocations.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    pending: Vec<PendingToolCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push(&mut self, fragment: PartialToolCallFragment) {
        while self.pending.len() <= fragment.index {
            self.pending.push(PendingToolCall::default());
        }
        let slot = &mut self.pending[fragment.index];

        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            slot.id = id;
        }
        if let Some(name) = fragment.name.filter(|name| !name.is_empty()) {
            slot.name = name;
        }
        if let Some(arguments) = fragment.arguments {
            slot.arguments.push_str(&arguments);
        }
    }

    /// Validate every pending call, in index order.
    pub fn finish(self) -> AssembledToolCalls {
        let mut assembled = AssembledToolCalls::default();

        for (index, pending) in self.pending.into_iter().enumerate() {
            // Padding slots that never received a fragment are not calls.
            if pending == PendingToolCall::default() {
                continue;
            }

            match ToolInvocation::from_parts(&pending.id, &pending.name, &pending.arguments) {
                Ok(invocation) => assembled.invocations.push(invocation),
                Err(issue) => {
                    tracing::warn!(index, id = %pending.id, name = %pending.name, %issue, "dropping tool call");
                    assembled.dropped.push(DroppedToolCall {
                        index,
                        id: non_empty(pending.id),
                        name: non_empty(pending.name),
                        issue,
                    });
                }
            }
        }

        assembled
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
