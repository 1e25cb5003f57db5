pub mod commands;

use crate::error::{ToolError, TurnError};
use crate::state::session::{BranchOutcome, CommitOutcome, GitInitOutcome};
use crate::state::{ConversationDriver, ConversationStreamUpdate};
use crate::tools::AddedContext;
use crate::ui::render::{
    clear_screen, print_assistant_prefix, print_banner, print_delta, print_error, print_help,
    print_note, print_panel, print_reasoning, print_success, print_tool_call, print_tool_result,
    print_warning, GIT_INFO,
};
use crate::util::is_affirmative;
use anyhow::Result;
use commands::{parse_command, FolderAction, LocalCommand};
use crossterm::style::Color;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::future::Future;
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const PREVIEW_NAMES: usize = 5;

/// Interactive front end: reads lines, runs local commands, and drives model turns.
pub struct App {
    driver: ConversationDriver,
    editor: DefaultEditor,
    should_quit: bool,
}

impl App {
    pub fn new(driver: ConversationDriver) -> Result<Self> {
        Ok(Self {
            driver,
            editor: DefaultEditor::new()?,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        print_banner();
        if !self.driver.session().git.enabled {
            print_note("No Git repository here. Use /git init to create one.");
        }

        while !self.should_quit {
            let prompt = prompt_for(
                self.driver.session().git.enabled,
                self.driver.session().git.branch.as_deref(),
            );
            let line = match self.editor.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    print_warning("Interrupted. Ctrl+D or /exit to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("👋 Goodbye! (EOF)");
                    break;
                }
                Err(error) => return Err(error.into()),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(input);

            match parse_command(input) {
                Some(command) => self.handle_local_command(command),
                None => self.run_turn(input).await,
            }
        }
        Ok(())
    }

    async fn run_turn(&mut self, input: &str) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut printer = TurnPrinter::default();

        print_assistant_prefix();
        let result = drive_turn(
            self.driver.send_message(input, Some(&tx), &cancel),
            tokio::signal::ctrl_c(),
            &mut rx,
            &cancel,
            &mut printer,
        )
        .await;
        while let Ok(update) = rx.try_recv() {
            printer.render(update);
        }
        printer.finish_line();

        match result {
            Ok(summary) => {
                tracing::debug!(
                    tool_calls = summary.tool_calls,
                    dropped = summary.dropped_tool_calls,
                    finish = ?summary.finish_reason,
                    "turn complete"
                );
            }
            Err(error) if matches!(error.downcast_ref::<TurnError>(), Some(TurnError::Interrupted)) => {
                print_warning("Interrupted. The last message was discarded. Ctrl+D or /exit to quit.");
            }
            Err(error) => {
                print_error(&format!("{error:#}"));
            }
        }
    }

    fn handle_local_command(&mut self, command: LocalCommand) {
        match command {
            LocalCommand::Add(raw) => self.add_to_context(&raw),
            LocalCommand::Folder(action) => self.folder(action),
            LocalCommand::Help => print_help(),
            LocalCommand::Clear => clear_screen(),
            LocalCommand::Exit => {
                println!("👋 Goodbye!");
                self.should_quit = true;
            }
            LocalCommand::GitInit => self.git_init(),
            LocalCommand::GitBranch(name) => self.git_branch(&name),
            LocalCommand::GitStatus => self.git_status(),
            LocalCommand::GitInfo => println!("{GIT_INFO}"),
            LocalCommand::Commit(message) => self.commit(message),
            LocalCommand::Usage(text) => print_warning(text),
        }
    }

    fn add_to_context(&mut self, raw: &str) {
        match self.driver.add_path_to_context(raw) {
            Ok(AddedContext::File(path)) => {
                print_success(&format!("Added file '{}' to conversation.", path.display()));
            }
            Ok(AddedContext::Directory {
                root,
                added,
                skipped,
                hit_limit,
            }) => {
                if hit_limit {
                    print_warning("Max files reached for directory scan.");
                }
                print_success(&format!("Added folder '{}'.", root.display()));
                if !added.is_empty() {
                    print_note(&format!(
                        "📁 Added: ({}) {}",
                        added.len(),
                        preview_names(added.iter().map(|path| path.as_path()))
                    ));
                }
                if !skipped.is_empty() {
                    print_note(&format!(
                        "⏭ Skipped: ({}) {}",
                        skipped.len(),
                        preview_names(skipped.iter().map(|file| file.path.as_path()))
                    ));
                }
            }
            Err(ToolError::NotFound(_)) => {
                print_error(&format!("Path does not exist: '{raw}'"));
            }
            Err(error) => print_error(&format!("Could not add path '{raw}': {error}")),
        }
    }

    fn folder(&mut self, action: FolderAction) {
        let paths = &mut self.driver.session_mut().paths;
        match action {
            FolderAction::Show => {
                print_note(&format!("Current base directory: '{}'", paths.base_dir().display()));
                print_note("Usage: /folder <path> or /folder reset");
            }
            FolderAction::Reset => {
                let old = paths.base_dir().to_path_buf();
                let new = paths.reset().to_path_buf();
                print_success(&format!(
                    "Base directory reset from '{}' to: '{}'",
                    old.display(),
                    new.display()
                ));
            }
            FolderAction::Set(raw) => {
                let old = paths.base_dir().to_path_buf();
                let new = match paths.set_base_dir(&raw) {
                    Ok(new) => new.to_path_buf(),
                    Err(error) => {
                        print_error(&format!("Error setting base directory: {error}"));
                        return;
                    }
                };
                print_success(&format!(
                    "Base directory changed from '{}' to: '{}'",
                    old.display(),
                    new.display()
                ));
                print_note("All relative paths will now be resolved against this directory.");
                self.add_to_context(&new.to_string_lossy());
            }
        }
    }

    fn git_init(&mut self) {
        let outcome = self.driver.session_mut().git_init();
        match outcome {
            Ok(GitInitOutcome::AlreadyExists) => {
                print_warning("Git repo already exists.");
                return;
            }
            Ok(GitInitOutcome::Initialized { branch }) => {
                let root = self.driver.session().repo_root().display().to_string();
                print_success(&format!("Initialized Git repo in {root}/.git/ (branch: {branch})"));
            }
            Err(error) => {
                print_error(&format!("Failed to init Git: {error}"));
                return;
            }
        }

        let gitignore = self.driver.session().repo_root().join(".gitignore");
        if gitignore.exists() {
            if let Some(staged) = self.driver.session_mut().stage_if_enabled(&gitignore) {
                print_note(&staged.describe());
            }
        } else if self.confirm("🔵 No .gitignore. Create one? (y/n, default y): ", true) {
            let extra = self.custom_gitignore_patterns();
            match self.driver.session_mut().write_default_gitignore(&extra) {
                Ok(Some((count, staged))) => {
                    print_success(&format!("Created .gitignore ({count} patterns)"));
                    if let Some(staged) = staged {
                        print_note(&staged.describe());
                    }
                }
                Ok(None) => print_warning(".gitignore exists, skipping."),
                Err(error) => print_error(&format!("Error creating .gitignore: {error}")),
            }
        }

        if self.confirm("🔵 Initial commit? (y/n, default n): ", false) {
            self.commit_all("Initial commit");
        }
    }

    fn custom_gitignore_patterns(&mut self) -> Vec<String> {
        let mut patterns = Vec::new();
        if !self.confirm("🔵 Add custom patterns? (y/n, default n): ", false) {
            return patterns;
        }
        print_note("Enter patterns (empty line to finish):");
        while let Some(pattern) = self.ask("  Pattern: ") {
            if pattern.is_empty() {
                break;
            }
            patterns.push(pattern);
        }
        patterns
    }

    fn git_branch(&mut self, name: &str) {
        if !self.driver.session().git.enabled {
            print_warning("Git not enabled.");
            return;
        }

        let exists = match self.driver.session_mut().branch_exists(name) {
            Ok(exists) => exists,
            Err(error) => {
                print_error(&format!("Branch op failed: {error}"));
                return;
            }
        };
        if exists {
            print_warning(&format!("Branch '{name}' exists."));
            let current = self.driver.session().git.branch.as_deref() == Some(name);
            if current || !self.confirm(&format!("🔵 Switch to '{name}'? (y/n, default y): "), true)
            {
                return;
            }
        }

        match self.driver.session_mut().git_switch_branch(name) {
            Ok(BranchOutcome::AlreadyOn(branch)) => print_note(&format!("Already on '{branch}'.")),
            Ok(BranchOutcome::Switched(branch)) => {
                print_success(&format!("Switched to branch '{branch}'"))
            }
            Ok(BranchOutcome::Created(branch)) => {
                print_success(&format!("Created & switched to new branch '{branch}'"))
            }
            Err(error) => print_error(&format!("Branch op failed: {error}")),
        }
    }

    fn git_status(&mut self) {
        if !self.driver.session().git.enabled {
            print_warning("Git not enabled.");
            return;
        }
        match self.driver.session_mut().git_status() {
            Ok(report) => print_panel("Git Status", &report.render(), Color::Blue),
            Err(error) => print_error(&format!("Error getting Git status: {error}")),
        }
    }

    fn commit(&mut self, message: Option<String>) {
        if !self.driver.session().git.enabled {
            print_warning("Git not enabled. `/git init` first.");
            return;
        }
        let message = match message {
            Some(message) => message,
            None => self.ask("🔵 Enter commit message: ").unwrap_or_default(),
        };
        if message.is_empty() {
            print_warning("Commit aborted. Message empty.");
            return;
        }
        self.commit_all(&message);
    }

    fn commit_all(&mut self, message: &str) {
        match self.driver.session_mut().git_commit_all(message) {
            Ok(CommitOutcome::NothingStaged) => print_warning("No changes staged for commit."),
            Ok(CommitOutcome::Committed(descriptor)) => {
                print_success(&format!("Committed: \"{message}\""));
                print_note(&format!("Commit: {descriptor}"));
            }
            Err(error) => print_error(&format!("Commit failed: {error}")),
        }
    }

    /// Read one trimmed answer; `None` when the user interrupts or closes input.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(answer) => Some(answer.trim().to_string()),
            Err(error) => {
                tracing::debug!(%error, "prompt abandoned");
                None
            }
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> bool {
        self.ask(prompt)
            .map(|answer| is_affirmative(&answer, default))
            .unwrap_or(false)
    }
}

fn prompt_for(git_enabled: bool, branch: Option<&str>) -> String {
    match branch {
        Some(branch) if git_enabled => format!("🌳 {branch} 🔵 You: "),
        _ => "🔵 You: ".to_string(),
    }
}

fn preview_names<'a>(paths: impl Iterator<Item = &'a Path>) -> String {
    let names: Vec<String> = paths
        .map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        })
        .collect();
    let shown = names.iter().take(PREVIEW_NAMES).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > PREVIEW_NAMES {
        format!("{shown}, ...")
    } else {
        shown
    }
}

/// Poll `turn` to completion while rendering its updates. `interrupt` is created once by the
/// caller and cancels the turn when it resolves.
async fn drive_turn<T, I>(
    turn: T,
    interrupt: I,
    rx: &mut mpsc::UnboundedReceiver<ConversationStreamUpdate>,
    cancel: &CancellationToken,
    printer: &mut TurnPrinter,
) -> T::Output
where
    T: Future,
    I: Future,
{
    tokio::pin!(turn, interrupt);
    loop {
        tokio::select! {
            result = &mut turn => break result,
            Some(update) = rx.recv() => printer.render(update),
            _ = &mut interrupt, if !cancel.is_cancelled() => {
                tracing::debug!("interrupt during turn");
                cancel.cancel();
            }
        }
    }
}

/// Renders one turn's updates, keeping prose and reasoning on separate lines.
#[derive(Default)]
struct TurnPrinter {
    in_reasoning: bool,
    mid_line: bool,
}

impl TurnPrinter {
    fn render(&mut self, update: ConversationStreamUpdate) {
        match update {
            ConversationStreamUpdate::Reasoning(text) => {
                self.in_reasoning = true;
                self.mid_line = !text.ends_with('\n');
                print_reasoning(&text);
            }
            ConversationStreamUpdate::Delta(text) => {
                if self.in_reasoning {
                    self.in_reasoning = false;
                    self.finish_line();
                }
                self.mid_line = !text.ends_with('\n');
                print_delta(&text);
            }
            ConversationStreamUpdate::ToolCall { name, arguments } => {
                self.finish_line();
                print_tool_call(&name, &arguments);
            }
            ConversationStreamUpdate::ToolResult { name, output } => {
                print_tool_result(&name, &output);
            }
            ConversationStreamUpdate::Diagnostic(text) => {
                self.finish_line();
                print_warning(&text);
            }
        }
    }

    fn finish_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_shows_branch_only_when_git_enabled() {
        assert_eq!(prompt_for(true, Some("main")), "🌳 main 🔵 You: ");
        assert_eq!(prompt_for(false, Some("main")), "🔵 You: ");
        assert_eq!(prompt_for(true, None), "🔵 You: ");
    }

    #[test]
    fn test_preview_names_caps_list() {
        let paths: Vec<std::path::PathBuf> = (0..7)
            .map(|i| std::path::PathBuf::from(format!("/tmp/dir/f{i}.rs")))
            .collect();
        let preview = preview_names(paths.iter().map(|path| path.as_path()));
        assert_eq!(preview, "f0.rs, f1.rs, f2.rs, f3.rs, f4.rs, ...");

        let short = preview_names([Path::new("a.py")].into_iter());
        assert_eq!(short, "a.py");
    }

    #[tokio::test]
    async fn test_interrupt_before_first_update_cancels_turn() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut printer = TurnPrinter::default();

        let turn = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tx.send(ConversationStreamUpdate::Delta("late".to_string()))
                    .expect("send update");
                tokio::task::yield_now().await;
                "rolled back"
            }
        };
        let outcome = drive_turn(
            turn,
            std::future::ready(()),
            &mut rx,
            &cancel,
            &mut printer,
        )
        .await;

        assert_eq!(outcome, "rolled back");
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_turn_finishes_without_interrupt() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut printer = TurnPrinter::default();

        let turn = async move {
            for _ in 0..3 {
                tx.send(ConversationStreamUpdate::Delta("x".to_string()))
                    .expect("send update");
                tokio::task::yield_now().await;
            }
            7
        };
        let outcome = drive_turn(
            turn,
            std::future::pending::<()>(),
            &mut rx,
            &cancel,
            &mut printer,
        )
        .await;

        assert_eq!(outcome, 7);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_printer_breaks_line_between_reasoning_and_text() {
        let mut printer = TurnPrinter::default();
        printer.render(ConversationStreamUpdate::Reasoning("hmm".to_string()));
        assert!(printer.in_reasoning);
        assert!(printer.mid_line);
        printer.render(ConversationStreamUpdate::Delta("answer\n".to_string()));
        assert!(!printer.in_reasoning);
        assert!(!printer.mid_line);
    }
}
