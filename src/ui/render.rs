use crate::ui::width::{display_width, pad_to_width, truncate_line, wrap_lines};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor,
};
use crossterm::ExecutableCommand;
use std::io::{stdout, Write};

const MIN_PANEL_WIDTH: usize = 20;
const DEFAULT_TERMINAL_WIDTH: usize = 100;
/// Output panels longer than this are cut; the model still receives the full text.
const MAX_PANEL_LINES: usize = 40;

pub const HELP_ROWS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/clear", "Clear screen"),
    ("/exit, /quit", "Exit application"),
    ("/folder", "Show current base directory"),
    ("/folder <path>", "Set base directory for file operations"),
    ("/folder reset", "Reset base directory to current working directory"),
    ("/add <path>", "Add file/dir to conversation context"),
    ("/git init", "Initialize Git repository"),
    ("/git status", "Show Git status"),
    ("/git branch <name>", "Create & switch to new branch"),
    ("/commit [msg]", "Stage all files & commit (prompts if no message)"),
    ("/git-info", "Show detailed Git capabilities"),
];

pub const GIT_INFO: &str = "I can use Git commands to interact with a Git repository. Here's what I can do for you:

1. Initialize a Git repository: git_init creates a new repository in the current directory.
2. Stage files for commit: git_add stages specific files for the next commit.
3. Commit changes: git_commit commits staged changes with a message.
4. Create and switch to a new branch: git_create_branch creates a branch and switches to it.
5. Check Git status: git_status shows staged, unstaged and untracked files.

Just describe what you want and I'll run the necessary Git operations.";

pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// Box `body` under `title`, sized to its content and capped at `max_width` columns.
pub fn panel_lines(title: &str, body: &str, max_width: usize) -> Vec<String> {
    let max_inner = max_width.saturating_sub(4).max(MIN_PANEL_WIDTH);
    let mut rows = wrap_lines(body.trim_end(), max_inner);
    if rows.len() > MAX_PANEL_LINES {
        let hidden = rows.len() - MAX_PANEL_LINES;
        rows.truncate(MAX_PANEL_LINES);
        rows.push(format!("... ({hidden} more lines)"));
    }

    let title = truncate_line(title, max_inner.saturating_sub(2));
    let inner = rows
        .iter()
        .map(|row| display_width(row))
        .chain(std::iter::once(display_width(&title) + 2))
        .max()
        .unwrap_or(0)
        .clamp(MIN_PANEL_WIDTH.min(max_inner), max_inner);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let title_fill = (inner + 2).saturating_sub(display_width(&title) + 3);
    lines.push(format!("╭─ {title} {}╮", "─".repeat(title_fill)));
    for row in rows {
        lines.push(format!("│ {} │", pad_to_width(&row, inner)));
    }
    lines.push(format!("╰{}╯", "─".repeat(inner + 2)));
    lines
}

/// Two-column command table.
pub fn help_lines(rows: &[(&str, &str)]) -> Vec<String> {
    let command_width = rows
        .iter()
        .map(|(command, _)| display_width(command))
        .max()
        .unwrap_or(0)
        .max("Command".len());

    let mut lines = vec![
        "📝 Available Commands".to_string(),
        format!("  {}  Description", pad_to_width("Command", command_width)),
        format!("  {}  {}", "─".repeat(command_width), "─".repeat(11)),
    ];
    lines.extend(
        rows.iter()
            .map(|(command, description)| {
                format!("  {}  {description}", pad_to_width(command, command_width))
            }),
    );
    lines
}

pub fn print_panel(title: &str, body: &str, color: Color) {
    let mut out = stdout();
    out.execute(SetForegroundColor(color)).ok();
    for line in panel_lines(title, body, terminal_width()) {
        println!("{line}");
    }
    out.execute(ResetColor).ok();
}

pub fn print_banner() {
    print_panel(
        "seek",
        "🚀 DeepSeek Engineer Assistant\nType /help for commands. Ctrl+C to interrupt, Ctrl+D or /exit to quit.",
        Color::Blue,
    );
}

pub fn print_help() {
    let mut out = stdout();
    let lines = help_lines(HELP_ROWS);
    for (index, line) in lines.iter().enumerate() {
        if index < 2 {
            out.execute(SetForegroundColor(Color::Blue)).ok();
            out.execute(SetAttribute(Attribute::Bold)).ok();
        }
        println!("{line}");
        out.execute(SetAttribute(Attribute::Reset)).ok();
        out.execute(ResetColor).ok();
    }
}

pub fn print_tool_call(name: &str, arguments: &str) {
    print_panel(
        "🛠️ Function Call",
        &format!("Calling: {name}\nArgs: {arguments}"),
        Color::Yellow,
    );
}

pub fn print_tool_result(name: &str, output: &str) {
    print_panel(&format!("↪️ Output of {name}"), output, Color::Green);
}

pub fn print_assistant_prefix() {
    let mut out = stdout();
    out.execute(SetForegroundColor(Color::Magenta)).ok();
    out.execute(SetAttribute(Attribute::Bold)).ok();
    out.execute(Print("🤖 DeepSeek Engineer: ")).ok();
    out.execute(SetAttribute(Attribute::Reset)).ok();
    out.execute(ResetColor).ok();
}

pub fn print_delta(text: &str) {
    let mut out = stdout();
    out.execute(SetForegroundColor(Color::Magenta)).ok();
    out.execute(Print(text)).ok();
    out.execute(ResetColor).ok();
    let _ = out.flush();
}

pub fn print_reasoning(text: &str) {
    let mut out = stdout();
    out.execute(SetAttribute(Attribute::Dim)).ok();
    out.execute(Print(text)).ok();
    out.execute(SetAttribute(Attribute::Reset)).ok();
    let _ = out.flush();
}

fn print_colored(color: Color, text: &str) {
    let mut out = stdout();
    out.execute(SetForegroundColor(color)).ok();
    println!("{text}");
    out.execute(ResetColor).ok();
}

pub fn print_success(text: &str) {
    print_colored(Color::Green, &format!("✓ {text}"));
}

pub fn print_warning(text: &str) {
    print_colored(Color::Yellow, &format!("⚠ {text}"));
}

pub fn print_error(text: &str) {
    print_colored(Color::Red, &format!("✗ {text}"));
}

pub fn print_note(text: &str) {
    print_colored(Color::DarkGrey, text);
}

pub fn clear_screen() {
    let mut out = stdout();
    out.execute(crossterm::terminal::Clear(crossterm::terminal::ClearType::All))
        .ok();
    out.execute(crossterm::cursor::MoveTo(0, 0)).ok();
}
