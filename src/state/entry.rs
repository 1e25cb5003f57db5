use crate::tools::ToolInvocation;
use crate::types::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One record of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
    pub tool_call_id: Option<String>,
    pub name: Option<String>,
}

impl ConversationEntry {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool_result(invocation: &ToolInvocation, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(invocation.id.clone()),
            name: Some(invocation.name.clone()),
            ..Self::plain(Role::Tool, output)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }

    pub fn to_api_message(&self) -> ChatMessage {
        let tool_calls = if self.tool_calls.is_empty() {
            None
        } else {
            Some(self.tool_calls.iter().map(ToolInvocation::to_wire).collect())
        };
        // Tool-calling assistant turns with no prose are sent as `content: null`.
        let content = if self.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(self.content.clone())
        };

        ChatMessage {
            role: self.role.as_str().to_string(),
            content,
            tool_calls,
            tool_call_id: self.tool_call_id.clone(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_carries_invocation_identity() {
        let invocation =
            ToolInvocation::from_parts("call_9", "git_status", "{}").expect("valid invocation");
        let entry = ConversationEntry::tool_result(&invocation, "clean");

        let message = entry.to_api_message();
        assert_eq!(message.role, "tool");
        assert_eq!(message.tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(message.name.as_deref(), Some("git_status"));
        assert_eq!(message.content.as_deref(), Some("clean"));
    }

    #[test]
    fn test_empty_assistant_with_calls_sends_null_content() {
        let invocation =
            ToolInvocation::from_parts("call_1", "git_init", "").expect("valid invocation");
        let message = ConversationEntry::assistant("", vec![invocation]).to_api_message();
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls.map(|calls| calls.len()), Some(1));

        let plain = ConversationEntry::assistant("", Vec::new()).to_api_message();
        assert_eq!(plain.content.as_deref(), Some(""));
    }
}
