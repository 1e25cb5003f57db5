use crate::api::ApiClient;
use crate::error::ToolError;
use crate::state::context::ContextStore;
use crate::state::session::Session;
use crate::tools::{AddedContext, ToolDispatcher};
use std::sync::Arc;

pub const SYSTEM_PROMPT: &str = "You are an elite software engineer called DeepSeek Engineer with decades of experience across all programming domains.
Your expertise spans system design, algorithms, testing, and best practices.
You provide thoughtful, well-structured solutions while explaining your reasoning.

Core capabilities:
1. Code Analysis & Discussion
   - Analyze code with expert-level insight
   - Explain complex concepts clearly
   - Suggest optimizations and best practices
   - Debug issues with precision

2. File Operations (via function calls):
   - read_file: Read a single file's content
   - read_multiple_files: Read multiple files at once
   - create_file: Create or overwrite a single file
   - create_multiple_files: Create multiple files at once
   - edit_file: Make precise edits to existing files using snippet replacement

3. Git Operations (via function calls):
   - git_init: Initialize a new Git repository in the current directory.
   - git_add: Stage specified file(s) for the next commit. Use this before git_commit.
   - git_commit: Commit staged changes with a message. Ensure files are staged first using git_add.
   - git_create_branch: Create and switch to a new Git branch.
   - git_status: Show the current Git status, useful for seeing what is staged or unstaged.

Guidelines:
1. Provide natural, conversational responses explaining your reasoning
2. Use function calls when you need to read or modify files, or interact with Git.
3. For file operations:
   - Always read files first before editing them to understand the context
   - Use precise snippet matching for edits; the original snippet must occur exactly once
   - Explain what changes you're making and why
   - Consider the impact of changes on the overall codebase
4. For Git operations:
   - Use `git_add` to stage files before using `git_commit`.
   - Provide clear commit messages.
   - Check `git_status` if unsure about the state of the repository.
5. Follow language-specific best practices
6. Suggest tests or validation steps when appropriate
7. Be thorough in your analysis and recommendations

IMPORTANT: In your thinking process, if you realize that something requires a tool call, cut your thinking short and proceed directly to the tool call. Don't overthink - act efficiently when file or Git operations are needed.

Remember: You're a senior engineer - be thoughtful, precise, and explain your reasoning clearly.
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationStreamUpdate {
    Delta(String),
    Reasoning(String),
    ToolCall { name: String, arguments: String },
    ToolResult { name: String, output: String },
    Diagnostic(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingInput,
    Dispatching,
    ProcessingToolCalls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSummary {
    pub assistant_text: String,
    pub tool_calls: usize,
    pub dropped_tool_calls: usize,
    pub finish_reason: Option<String>,
}

/// Owns the conversation log and session, and runs one model turn per user input.
pub struct ConversationDriver {
    pub(super) client: Arc<ApiClient>,
    pub(super) store: ContextStore,
    pub(super) session: Session,
    pub(super) max_history_messages: usize,
    pub(super) state: DriverState,
}

impl ConversationDriver {
    pub fn new(
        client: ApiClient,
        session: Session,
        max_history_messages: usize,
        max_context_files: usize,
    ) -> Self {
        Self {
            client: Arc::new(client),
            store: ContextStore::new(SYSTEM_PROMPT, max_context_files),
            session,
            max_history_messages,
            state: DriverState::AwaitingInput,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn add_path_to_context(&mut self, raw: &str) -> Result<AddedContext, ToolError> {
        ToolDispatcher::new(&mut self.session, &mut self.store).add_path_to_context(raw)
    }
}
