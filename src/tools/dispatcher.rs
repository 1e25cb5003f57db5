use super::editor::{apply_edit, snippet_excerpt};
use super::ingest::{read_text_file, scan_directory, SkippedFile};
use super::invocation::{
    CreateMultipleFilesArgs, FileEditRequest, GitAddArgs, ToolInvocation, ToolRequest,
};
use crate::error::ToolError;
use crate::state::context::ContextStore;
use crate::state::session::{BranchOutcome, CommitOutcome, GitInitOutcome, Session, StageOutcome};
use std::path::{Path, PathBuf};

const FILE_SEPARATOR: &str = "\n\n==================== FILE SEP ====================\n\n";
const GIT_DISABLED: &str = "Git not initialized.";

/// What `/add` (or `/folder`) put into context.
#[derive(Debug)]
pub enum AddedContext {
    File(PathBuf),
    Directory {
        root: PathBuf,
        added: Vec<PathBuf>,
        skipped: Vec<SkippedFile>,
        hit_limit: bool,
    },
}

/// Executes tool calls against the session, recording file context as it goes.
pub struct ToolDispatcher<'a> {
    session: &'a mut Session,
    store: &'a mut ContextStore,
}

impl<'a> ToolDispatcher<'a> {
    pub fn new(session: &'a mut Session, store: &'a mut ContextStore) -> Self {
        Self { session, store }
    }

    /// Run one invocation. Every failure is rendered into the returned text.
    pub fn dispatch(&mut self, invocation: &ToolInvocation) -> String {
        tracing::info!(id = %invocation.id, name = %invocation.name, "dispatching tool call");
        let output = match &invocation.request {
            ToolRequest::ReadFile(args) => self.read_file(&args.file_path),
            ToolRequest::ReadMultipleFiles(args) => self.read_multiple_files(&args.file_paths),
            ToolRequest::CreateFile(args) => self.create_file(&args.file_path, &args.content),
            ToolRequest::CreateMultipleFiles(args) => self.create_multiple_files(args),
            ToolRequest::EditFile(request) => self.edit_file(request),
            ToolRequest::GitInit(_) => self.git_init(),
            ToolRequest::GitAdd(args) => self.git_add(args),
            ToolRequest::GitCommit(args) => self.git_commit(&args.message),
            ToolRequest::GitCreateBranch(args) => self.git_create_branch(&args.branch_name),
            ToolRequest::GitStatus(_) => self.git_status(),
            ToolRequest::Unknown { name } => {
                tracing::warn!(%name, "model requested an unknown operation");
                format!("Unknown operation: {name}")
            }
        };
        tracing::debug!(id = %invocation.id, bytes = output.len(), "tool call finished");
        output
    }

    fn read_file(&mut self, raw: &str) -> String {
        match self.session.read_file(raw) {
            Ok((path, content)) => format!("Content of file '{}':\n\n{content}", path.display()),
            Err(e) => format!("Error reading '{raw}': {e}"),
        }
    }

    fn read_multiple_files(&mut self, raws: &[String]) -> String {
        if raws.is_empty() {
            return "No file paths provided.".to_string();
        }
        raws.iter()
            .map(|raw| match self.session.read_file(raw) {
                Ok((path, content)) => format!("Content of '{}':\n\n{content}", path.display()),
                Err(e) => format!("Error reading '{raw}': {e}"),
            })
            .collect::<Vec<_>>()
            .join(FILE_SEPARATOR)
    }

    fn create_file(&mut self, raw: &str, content: &str) -> String {
        match self.session.create_file(raw, content) {
            Ok((path, staged)) => {
                let mut text = format!("File '{}' created/updated.", path.display());
                append_stage_note(&mut text, staged.as_ref());
                text
            }
            Err(e) => format!("Error creating '{raw}': {e}"),
        }
    }

    fn create_multiple_files(&mut self, args: &CreateMultipleFilesArgs) -> String {
        let mut created = Vec::new();
        let mut errors = Vec::new();
        for file in &args.files {
            match self.session.create_file(&file.path, &file.content) {
                Ok(_) => created.push(file.path.as_str()),
                Err(e) => errors.push(format!("Error creating {}: {e}", file.path)),
            }
        }

        let mut parts = Vec::new();
        if !created.is_empty() {
            parts.push(format!(
                "Created/updated {} files: {}",
                created.len(),
                created.join(", ")
            ));
        }
        if !errors.is_empty() {
            parts.push(format!("Errors: {}", errors.join("; ")));
        }
        if parts.is_empty() {
            "No files processed.".to_string()
        } else {
            parts.join(". ")
        }
    }

    /// Make sure the file's current content is in context before it is edited.
    fn ensure_file_in_context(&mut self, path: &Path) -> Result<(), ToolError> {
        if self.store.has_file_context(path) {
            return Ok(());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ToolError::from_io(path, e))?;
        self.store.add_file_context(path, &content);
        Ok(())
    }

    fn edit_file(&mut self, request: &FileEditRequest) -> String {
        let path = self.session.paths.resolve(&request.path);
        if let Err(e) = self.ensure_file_in_context(&path) {
            return format!("Error: Could not read '{}' for editing: {e}", request.path);
        }

        match apply_edit(&path, &request.original_snippet, &request.new_snippet) {
            Ok(updated) => {
                self.store.add_file_context(&path, &updated);
                let mut text = format!("Edit applied to '{}'.", path.display());
                let staged = self.session.stage_if_enabled(&path);
                append_stage_note(&mut text, staged.as_ref());
                text
            }
            Err(e @ (ToolError::SnippetNotFound(_) | ToolError::AmbiguousEdit { .. })) => {
                let actual = std::fs::read_to_string(&path).unwrap_or_default();
                format!(
                    "Error during edit_file for '{}': {e}. No changes made.\n\nExpected snippet:\n{}\n\nActual content (or relevant part):\n{}",
                    request.path,
                    request.original_snippet,
                    snippet_excerpt(&actual, &request.original_snippet)
                )
            }
            Err(e) => format!("Error during edit_file for '{}': {e}.", request.path),
        }
    }

    fn git_init(&mut self) -> String {
        match self.session.git_init() {
            Ok(GitInitOutcome::AlreadyExists) => "Git repository already exists.".to_string(),
            Ok(GitInitOutcome::Initialized { branch }) => {
                let mut text = format!(
                    "Git repository initialized successfully in {}/.git/ (branch: {branch}).",
                    self.session.repo_root().display()
                );
                match self.session.write_default_gitignore(&[]) {
                    Ok(Some((patterns, staged))) => {
                        text.push_str(&format!(" Created .gitignore ({patterns} patterns)."));
                        append_stage_note(&mut text, staged.as_ref());
                    }
                    Ok(None) => {
                        let existing = self.session.repo_root().join(".gitignore");
                        let staged = self.session.stage_if_enabled(&existing);
                        append_stage_note(&mut text, staged.as_ref());
                    }
                    Err(e) => text.push_str(&format!(" Could not create .gitignore: {e}.")),
                }
                text
            }
            Err(e) => format!("Failed to initialize Git repository: {e}"),
        }
    }

    fn git_add(&mut self, args: &GitAddArgs) -> String {
        if !self.session.git.enabled {
            return GIT_DISABLED.to_string();
        }
        if args.file_paths.is_empty() {
            return "No file paths to stage.".to_string();
        }

        let mut staged = Vec::new();
        let mut failed = Vec::new();
        for raw in &args.file_paths {
            let path = self.session.paths.resolve(raw);
            match self.session.stage(&path) {
                StageOutcome::Staged(relative) => staged.push(relative.display().to_string()),
                other => failed.push(other.describe()),
            }
        }

        let mut parts = Vec::new();
        if !staged.is_empty() {
            parts.push(format!("Staged: {}", staged.join(", ")));
        }
        if !failed.is_empty() {
            parts.push(format!("Failed to stage: {}", failed.join("; ")));
        }
        if parts.is_empty() {
            "No files staged. Check paths.".to_string()
        } else {
            format!("{}.", parts.join(". "))
        }
    }

    fn git_commit(&mut self, message: &str) -> String {
        if !self.session.git.enabled {
            return GIT_DISABLED.to_string();
        }
        let message = message.trim();
        if message.is_empty() {
            return "Commit message empty.".to_string();
        }
        match self.session.git_commit(message) {
            Ok(CommitOutcome::NothingStaged) => "No changes staged. Use git_add first.".to_string(),
            Ok(CommitOutcome::Committed(descriptor)) => format!("Committed. Commit: {descriptor}"),
            Err(e) => format!("Failed to commit: {e}"),
        }
    }

    fn git_create_branch(&mut self, name: &str) -> String {
        if !self.session.git.enabled {
            return GIT_DISABLED.to_string();
        }
        let name = name.trim();
        if name.is_empty() {
            return "Branch name empty.".to_string();
        }
        match self.session.git_switch_branch(name) {
            Ok(BranchOutcome::AlreadyOn(b)) => format!("Already on branch '{b}'."),
            Ok(BranchOutcome::Switched(b)) => format!("Branch '{b}' exists. Switched to it."),
            Ok(BranchOutcome::Created(b)) => format!("Created & switched to new branch '{b}'."),
            Err(e) => format!("Branch op failed for '{name}': {e}"),
        }
    }

    fn git_status(&mut self) -> String {
        if !self.session.git.enabled {
            return GIT_DISABLED.to_string();
        }
        match self.session.git_status() {
            Ok(report) => report.render(),
            Err(e) => format!("Git status error: {e}"),
        }
    }

    /// Register a file, or every eligible file under a directory, as context.
    pub fn add_path_to_context(&mut self, raw: &str) -> Result<AddedContext, ToolError> {
        let path = self.session.paths.resolve(raw);
        let metadata = std::fs::metadata(&path).map_err(|e| ToolError::from_io(&path, e))?;

        if metadata.is_dir() {
            let scan = scan_directory(&path)?;
            let mut added = Vec::with_capacity(scan.accepted.len());
            for (file, content) in scan.accepted {
                self.store.add_file_context(&file, &content);
                added.push(file);
            }
            return Ok(AddedContext::Directory {
                root: path,
                added,
                skipped: scan.skipped,
                hit_limit: scan.hit_limit,
            });
        }

        let content = read_text_file(&path).map_err(|reason| {
            ToolError::MalformedArguments(format!("cannot add '{}': {reason}", path.display()))
        })?;
        self.store.add_file_context(&path, &content);
        Ok(AddedContext::File(path))
    }
}

fn append_stage_note(text: &mut String, staged: Option<&StageOutcome>) {
    if let Some(outcome) = staged {
        text.push(' ');
        text.push_str(&outcome.describe());
        text.push('.');
    }
}
