/// A line the REPL handles itself instead of sending it to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    Add(String),
    Folder(FolderAction),
    Help,
    Clear,
    Exit,
    GitInit,
    GitBranch(String),
    GitStatus,
    GitInfo,
    Commit(Option<String>),
    /// A recognised command with missing or bad arguments.
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderAction {
    Show,
    Reset,
    Set(String),
}

/// Parse `line` as a local command. Returns `None` for anything meant for the model,
/// including unrecognised slash words.
pub fn parse_command(line: &str) -> Option<LocalCommand> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let word = word.to_ascii_lowercase();
    let rest = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.as_str() {
        "/add" => match rest {
            Some(path) => LocalCommand::Add(path),
            None => LocalCommand::Usage("Usage: /add <path>"),
        },
        "/folder" => LocalCommand::Folder(match rest {
            None => FolderAction::Show,
            Some(arg) if arg.eq_ignore_ascii_case("reset") => FolderAction::Reset,
            Some(path) => FolderAction::Set(path),
        }),
        "/help" => LocalCommand::Help,
        "/clear" => LocalCommand::Clear,
        "/exit" | "/quit" => LocalCommand::Exit,
        "/git-info" => LocalCommand::GitInfo,
        "/commit" => LocalCommand::Commit(rest),
        "/git" => parse_git(rest.as_deref().unwrap_or("")),
        _ => return None,
    };
    Some(command)
}

fn parse_git(args: &str) -> LocalCommand {
    let (sub, rest) = match args.split_once(char::is_whitespace) {
        Some((sub, rest)) => (sub, rest.trim()),
        None => (args, ""),
    };
    match sub.to_ascii_lowercase().as_str() {
        "init" => LocalCommand::GitInit,
        "status" => LocalCommand::GitStatus,
        "branch" if rest.is_empty() => {
            LocalCommand::Usage("Specify branch name: /git branch <name>")
        }
        "branch" => LocalCommand::GitBranch(rest.to_string()),
        _ => LocalCommand::Usage("Usage: /git init | /git status | /git branch <name>"),
    }
}
