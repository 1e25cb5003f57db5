use crate::error::ToolError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Session-wide git state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitContext {
    pub enabled: bool,
    pub skip_staging: bool,
    pub branch: Option<String>,
}

impl GitContext {
    pub fn auto_staging(&self) -> bool {
        self.enabled && !self.skip_staging
    }
}

/// One line of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    pub fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
        output
            .lines()
            .filter(|line| line.len() > 3)
            .map(|line| StatusEntry {
                code: line[..2].to_string(),
                path: line[3..].to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatusReport {
    pub branch: Option<String>,
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
}

impl GitStatusReport {
    pub fn from_entries(branch: Option<String>, entries: &[StatusEntry]) -> Self {
        let mut report = Self {
            branch,
            ..Self::default()
        };
        for entry in entries {
            if entry.code == "??" {
                report.untracked.push(entry.path.clone());
            } else if entry.code.starts_with(' ') {
                report
                    .unstaged
                    .push(format!("{} {}", entry.code.trim(), entry.path));
            } else {
                report
                    .staged
                    .push(format!("{} {}", entry.code.trim(), entry.path));
            }
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    pub fn render(&self) -> String {
        let branch = self.branch.as_deref().unwrap_or("detached HEAD");
        if self.is_clean() {
            return format!("On branch '{branch}'. Working tree clean.");
        }

        let mut lines = vec![format!("On branch '{branch}'.")];
        for (title, group) in [
            ("Changes to be committed:", &self.staged),
            ("Changes not staged for commit:", &self.unstaged),
            ("Untracked files:", &self.untracked),
        ] {
            if !group.is_empty() {
                lines.push(format!("\n{title}"));
                lines.extend(group.iter().map(|item| format!("  {item}")));
            }
        }
        lines.join("\n")
    }
}

/// The version-control operations the assistant relies on.
pub trait GitBackend: Send {
    fn is_repository(&self) -> bool;
    fn init(&self) -> Result<(), ToolError>;
    fn current_branch(&self) -> Result<Option<String>, ToolError>;
    fn default_branch(&self) -> Result<Option<String>, ToolError>;
    /// Stage one path given relative to the repository root.
    fn stage(&self, relative: &Path) -> Result<(), ToolError>;
    fn stage_all(&self) -> Result<(), ToolError>;
    fn has_staged_changes(&self) -> Result<bool, ToolError>;
    /// Commit staged changes and return a short `<hash> <subject>` descriptor.
    fn commit(&self, message: &str) -> Result<String, ToolError>;
    fn branch_exists(&self, name: &str) -> Result<bool, ToolError>;
    fn checkout(&self, name: &str, create: bool) -> Result<(), ToolError>;
    fn status(&self) -> Result<Vec<StatusEntry>, ToolError>;
}

/// Runs the `git` executable inside a fixed repository root.
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    fn output(&self, args: &[&str]) -> Result<Output, ToolError> {
        tracing::debug!(args = ?args, root = %self.repo_root.display(), "running git");
        Command::new("git")
            .current_dir(&self.repo_root)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ToolError::GitUnavailable,
                _ => ToolError::GitOperationFailed {
                    command: args.join(" "),
                    details: e.to_string(),
                },
            })
    }

    fn run_git(&self, args: &[&str]) -> Result<String, ToolError> {
        let output = self.output(args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            let details = if stderr.is_empty() { stdout } else { stderr };
            return Err(ToolError::GitOperationFailed {
                command: args.join(" "),
                details,
            });
        }
        Ok(stdout)
    }

    fn succeeds(&self, args: &[&str]) -> Result<bool, ToolError> {
        Ok(self.output(args)?.status.success())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl GitBackend for GitCli {
    fn is_repository(&self) -> bool {
        self.repo_root.join(".git").exists()
    }

    fn init(&self) -> Result<(), ToolError> {
        self.run_git(&["init"]).map(|_| ())
    }

    fn current_branch(&self) -> Result<Option<String>, ToolError> {
        self.run_git(&["branch", "--show-current"]).map(non_empty)
    }

    fn default_branch(&self) -> Result<Option<String>, ToolError> {
        // Exit status 1 just means the key is unset.
        let output = self.output(&["config", "init.defaultBranch"])?;
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(non_empty(value))
    }

    fn stage(&self, relative: &Path) -> Result<(), ToolError> {
        let pathspec = relative.to_string_lossy();
        self.run_git(&["add", "--", pathspec.as_ref()]).map(|_| ())
    }

    fn stage_all(&self) -> Result<(), ToolError> {
        self.run_git(&["add", "-A"]).map(|_| ())
    }

    fn has_staged_changes(&self) -> Result<bool, ToolError> {
        // `diff --quiet` exits 0 when nothing is staged.
        Ok(!self.succeeds(&["diff", "--staged", "--quiet"])?)
    }

    fn commit(&self, message: &str) -> Result<String, ToolError> {
        self.run_git(&["commit", "-m", message])?;
        self.run_git(&["log", "-1", "--pretty=%h %s"])
    }

    fn branch_exists(&self, name: &str) -> Result<bool, ToolError> {
        let reference = format!("refs/heads/{name}");
        self.succeeds(&["rev-parse", "--verify", "--quiet", reference.as_str()])
    }

    fn checkout(&self, name: &str, create: bool) -> Result<(), ToolError> {
        if create {
            self.run_git(&["checkout", "-b", name]).map(|_| ())
        } else {
            self.run_git(&["checkout", name]).map(|_| ())
        }
    }

    fn status(&self) -> Result<Vec<StatusEntry>, ToolError> {
        let output = self.output(&["status", "--porcelain"])?;
        if !output.status.success() {
            return Err(ToolError::GitOperationFailed {
                command: "status --porcelain".to_string(),
                details: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // Leading spaces are significant in porcelain codes, so no trim here.
        Ok(StatusEntry::parse_porcelain(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

pub const DEFAULT_GITIGNORE_PATTERNS: &[&str] = &[
    "# Python", "__pycache__/", "*.pyc", "*.pyo", "*.pyd", ".Python", "env/", "venv/", ".venv",
    "ENV/", "*.egg-info/", "dist/", "build/", ".pytest_cache/", ".mypy_cache/", ".coverage",
    "htmlcov/", "", "# Rust", "target/", "", "# Env", ".env", ".env*.local", "!.env.example", "",
    "# IDE", ".vscode/", ".idea/", "*.swp", "*.swo", ".DS_Store", "", "# Logs", "*.log", "logs/",
    "", "# Temp", "*.tmp", "*.temp", "*.bak", "*.cache", "Thumbs.db", "desktop.ini", "", "# Node",
    "node_modules/", "npm-debug.log*", "yarn-debug.log*", "pnpm-lock.yaml", "package-lock.json",
    "", "# Local", "*.session", "*.checkpoint",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porcelain_parsing_keeps_leading_space_codes() {
        let entries = StatusEntry::parse_porcelain(" M src/lib.rs\nA  new.rs\n?? notes.md\n");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].code, " M");
        assert_eq!(entries[0].path, "src/lib.rs");
        assert_eq!(entries[2].code, "??");
    }

    #[test]
    fn test_status_report_partitions_entries() {
        let entries = StatusEntry::parse_porcelain(" M src/lib.rs\nA  new.rs\n?? notes.md\nMM both.rs\n");
        let report = GitStatusReport::from_entries(Some("main".to_string()), &entries);

        assert_eq!(report.staged, vec!["A new.rs", "MM both.rs"]);
        assert_eq!(report.unstaged, vec!["M src/lib.rs"]);
        assert_eq!(report.untracked, vec!["notes.md"]);

        let rendered = report.render();
        assert!(rendered.starts_with("On branch 'main'."));
        assert!(rendered.contains("Changes to be committed:\n  A new.rs"));
        assert!(rendered.contains("Untracked files:\n  notes.md"));
    }

    #[test]
    fn test_clean_status_renders_single_line() {
        let report = GitStatusReport::from_entries(None, &[]);
        assert_eq!(report.render(), "On branch 'detached HEAD'. Working tree clean.");
    }

    #[test]
    fn test_auto_staging_requires_enabled_and_not_skipped() {
        let mut git = GitContext {
            enabled: true,
            skip_staging: false,
            branch: None,
        };
        assert!(git.auto_staging());
        git.skip_staging = true;
        assert!(!git.auto_staging());
    }
}
