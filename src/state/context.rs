use super::entry::{ConversationEntry, Role};
use crate::error::ContextError;
use crate::types::ChatMessage;
use std::path::Path;

pub const FILE_CONTEXT_PREFIX: &str = "User added file '";
/// File-context entries that survive truncation, newest first.
pub const FILE_CONTEXTS_KEPT_ON_TRUNCATE: usize = 3;

pub fn file_context_marker(path: &Path) -> String {
    format!("{FILE_CONTEXT_PREFIX}{}'", path.display())
}

pub fn is_file_context(entry: &ConversationEntry) -> bool {
    entry.role == Role::System && entry.content.starts_with(FILE_CONTEXT_PREFIX)
}

/// Position in the conversation (excluding the leading system block) to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Ordered conversation log with causal, bounded retention.
///
/// System entries (persona and file contexts) live in a leading block; user,
/// assistant and tool entries follow in turn order.
#[derive(Debug, Clone)]
pub struct ContextStore {
    entries: Vec<ConversationEntry>,
    max_file_contexts: usize,
}

impl ContextStore {
    pub fn new(persona: impl Into<String>, max_file_contexts: usize) -> Self {
        Self {
            entries: vec![ConversationEntry::system(persona)],
            max_file_contexts: max_file_contexts.max(1),
        }
    }

    pub fn empty(max_file_contexts: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_file_contexts: max_file_contexts.max(1),
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_api_messages(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .map(ConversationEntry::to_api_message)
            .collect()
    }

    fn system_prefix_len(&self) -> usize {
        self.entries
            .iter()
            .take_while(|entry| entry.role == Role::System)
            .count()
    }

    /// Append one entry, rejecting tool results that answer no pending call.
    pub fn append(&mut self, entry: ConversationEntry) -> Result<(), ContextError> {
        if entry.role == Role::Tool {
            if self.entries.is_empty() {
                return Err(ContextError::ToolResultFirst);
            }
            let call_id = entry.tool_call_id.clone().unwrap_or_default();
            let answers_latest_request = self
                .entries
                .iter()
                .rev()
                .find(|e| e.has_tool_calls())
                .is_some_and(|assistant| assistant.tool_calls.iter().any(|c| c.id == call_id));
            if !answers_latest_request {
                return Err(ContextError::OrphanToolResult(call_id));
            }
        }

        if entry.role == Role::System {
            let at = self.system_prefix_len();
            self.entries.insert(at, entry);
        } else {
            self.entries.push(entry);
        }
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len() - self.system_prefix_len())
    }

    /// Drop every conversation entry appended after `checkpoint`.
    pub fn rollback_to(&mut self, checkpoint: Checkpoint) {
        let keep = self.system_prefix_len() + checkpoint.0;
        if self.entries.len() > keep {
            tracing::debug!(removed = self.entries.len() - keep, "rolling back conversation");
            self.entries.truncate(keep);
        }
    }

    pub fn has_file_context(&self, path: &Path) -> bool {
        let marker = file_context_marker(path);
        self.entries
            .iter()
            .any(|entry| is_file_context(entry) && entry.content.starts_with(&marker))
    }

    pub fn file_context_count(&self) -> usize {
        self.entries.iter().filter(|e| is_file_context(e)).count()
    }

    /// Register `content` as the context for `path`, replacing any previous copy
    /// and evicting the oldest file contexts beyond the cap.
    pub fn add_file_context(&mut self, path: &Path, content: &str) {
        let marker = file_context_marker(path);
        self.entries
            .retain(|entry| !(is_file_context(entry) && entry.content.starts_with(&marker)));

        let mut count = self.file_context_count();
        while count >= self.max_file_contexts {
            match self.entries.iter().position(is_file_context) {
                Some(oldest) => {
                    tracing::debug!(
                        evicted = %self.entries[oldest].content.lines().next().unwrap_or_default(),
                        "evicting file context"
                    );
                    self.entries.remove(oldest);
                    count -= 1;
                }
                None => break,
            }
        }

        let at = self.system_prefix_len();
        self.entries.insert(
            at,
            ConversationEntry::system(format!("{marker}. Content:\n\n{content}")),
        );
    }

    /// Shrink the log to roughly `max_entries`, keeping tool results attached to
    /// the assistant entry that requested them.
    pub fn truncate(&mut self, max_entries: usize) {
        if self.entries.len() <= max_entries {
            return;
        }

        let mut persona = None;
        let mut file_contexts = Vec::new();
        let mut conversation = Vec::new();
        for entry in self.entries.drain(..) {
            if entry.role == Role::System {
                if persona.is_none() {
                    persona = Some(entry);
                } else if is_file_context(&entry) {
                    file_contexts.push(entry);
                }
            } else {
                conversation.push(entry);
            }
        }

        let first_kept_context = file_contexts
            .len()
            .saturating_sub(FILE_CONTEXTS_KEPT_ON_TRUNCATE);
        let mut kept: Vec<ConversationEntry> = persona.into_iter().collect();
        kept.extend(file_contexts.into_iter().skip(first_kept_context));

        let quota = max_entries.saturating_sub(kept.len());
        let suffix = causal_suffix(&conversation, quota);
        tracing::debug!(
            before = conversation.len(),
            after = suffix.len(),
            quota,
            "truncated conversation"
        );
        kept.extend(suffix);
        self.entries = kept;
    }
}

/// Newest groups of `conversation` until `quota` is met. A group is a single
/// user/assistant entry or an assistant-with-calls plus its tool results; the
/// last group taken may overshoot the quota.
fn causal_suffix(conversation: &[ConversationEntry], quota: usize) -> Vec<ConversationEntry> {
    let mut groups: Vec<&[ConversationEntry]> = Vec::new();
    let mut taken = 0;
    let mut end = conversation.len();

    while end > 0 && taken < quota {
        let last = &conversation[end - 1];
        if last.role != Role::Tool {
            groups.push(&conversation[end - 1..end]);
            taken += 1;
            end -= 1;
            continue;
        }

        let mut start = end;
        while start > 0 && conversation[start - 1].role == Role::Tool {
            start -= 1;
        }
        if start > 0 && conversation[start - 1].has_tool_calls() {
            start -= 1;
            groups.push(&conversation[start..end]);
            taken += end - start;
        } else {
            tracing::warn!(
                count = end - start,
                "dropping tool results without a requesting assistant entry"
            );
        }
        end = start;
    }

    groups.into_iter().rev().flatten().cloned().collect()
}
