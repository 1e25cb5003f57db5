use crate::error::ToolError;
use crate::tools::git::{
    GitBackend, GitCli, GitContext, GitStatusReport, DEFAULT_GITIGNORE_PATTERNS,
};
use crate::tools::paths::{has_home_reference, PathResolver};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_CREATE_FILE_BYTES: usize = 5_000_000;
const FALLBACK_BRANCH: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Staged(PathBuf),
    OutsideRepository(PathBuf),
    Failed { path: PathBuf, details: String },
}

impl StageOutcome {
    pub fn is_staged(&self) -> bool {
        matches!(self, StageOutcome::Staged(_))
    }

    pub fn describe(&self) -> String {
        match self {
            StageOutcome::Staged(rel) => format!("Staged {}", rel.display()),
            StageOutcome::OutsideRepository(path) => {
                format!("{} is outside the repository, skipping staging", path.display())
            }
            StageOutcome::Failed { path, details } => {
                format!("Failed to stage {}: {details}", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitInitOutcome {
    AlreadyExists,
    Initialized { branch: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    NothingStaged,
    Committed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    AlreadyOn(String),
    Switched(String),
    Created(String),
}

/// Per-process state the tools act on: base directory, repository and git flags.
pub struct Session {
    pub paths: PathResolver,
    pub git: GitContext,
    repo: Box<dyn GitBackend>,
    repo_root: PathBuf,
}

impl Session {
    /// Probe `startup_dir` for a repository using the `git` executable.
    pub fn probe(startup_dir: PathBuf, skip_staging: bool) -> Self {
        let paths = PathResolver::new(startup_dir);
        let repo_root = paths.startup_dir().to_path_buf();
        let repo = Box::new(GitCli::new(repo_root.clone()));
        Self::with_backend(paths, repo, skip_staging)
    }

    pub fn with_backend(
        paths: PathResolver,
        repo: Box<dyn GitBackend>,
        skip_staging: bool,
    ) -> Self {
        let repo_root = paths.startup_dir().to_path_buf();
        let mut session = Self {
            paths,
            git: GitContext {
                enabled: false,
                skip_staging,
                branch: None,
            },
            repo,
            repo_root,
        };

        if session.repo.is_repository() {
            session.git.enabled = true;
            session.git.branch = session.detect_branch();
        }
        tracing::debug!(git = ?session.git, root = %session.repo_root.display(), "session probed");
        session
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn guard<T>(&mut self, result: Result<T, ToolError>) -> Result<T, ToolError> {
        if let Err(error) = &result {
            if error.is_git_unavailable() && self.git.enabled {
                tracing::warn!("git executable missing; disabling git features");
                self.git.enabled = false;
            }
        }
        result
    }

    fn detect_branch(&mut self) -> Option<String> {
        let current = self.repo.current_branch();
        if let Ok(Some(branch)) = self.guard(current) {
            return Some(branch);
        }
        let configured = self.repo.default_branch();
        match self.guard(configured) {
            Ok(Some(branch)) => Some(branch),
            Err(ToolError::GitUnavailable) => None,
            _ => Some(FALLBACK_BRANCH.to_string()),
        }
    }

    pub fn read_file(&self, raw: &str) -> Result<(PathBuf, String), ToolError> {
        let path = self.paths.resolve(raw);
        let content = fs::read_to_string(&path).map_err(|e| ToolError::from_io(&path, e))?;
        Ok((path, content))
    }

    /// Write `content` to `raw`, creating parent directories, then auto-stage.
    pub fn create_file(
        &mut self,
        raw: &str,
        content: &str,
    ) -> Result<(PathBuf, Option<StageOutcome>), ToolError> {
        if has_home_reference(raw) {
            return Err(ToolError::HomeDirectoryReference(raw.to_string()));
        }
        if content.len() > MAX_CREATE_FILE_BYTES {
            return Err(ToolError::SizeLimitExceeded {
                size: content.len(),
                limit: MAX_CREATE_FILE_BYTES,
            });
        }

        let path = self.paths.resolve(raw);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ToolError::from_io(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| ToolError::from_io(&path, e))?;
        tracing::info!(path = %path.display(), bytes = content.len(), "file written");

        let staged = self.stage_if_enabled(&path);
        Ok((path, staged))
    }

    /// Stage `path` when auto-staging is on. Failures are reported, never raised.
    pub fn stage_if_enabled(&mut self, path: &Path) -> Option<StageOutcome> {
        if !self.git.auto_staging() {
            return None;
        }
        Some(self.stage(path))
    }

    pub fn stage(&mut self, path: &Path) -> StageOutcome {
        let Ok(relative) = path.strip_prefix(&self.repo_root) else {
            return StageOutcome::OutsideRepository(path.to_path_buf());
        };
        let relative = relative.to_path_buf();
        let result = self.repo.stage(&relative);
        match self.guard(result) {
            Ok(()) => StageOutcome::Staged(relative),
            Err(e) => StageOutcome::Failed {
                path: relative,
                details: e.to_string(),
            },
        }
    }

    pub fn git_init(&mut self) -> Result<GitInitOutcome, ToolError> {
        if self.repo.is_repository() {
            self.git.enabled = true;
            if self.git.branch.is_none() {
                self.git.branch = self.detect_branch();
            }
            return Ok(GitInitOutcome::AlreadyExists);
        }

        let result = self.repo.init();
        self.guard(result)?;
        self.git.enabled = true;
        let branch = self
            .detect_branch()
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string());
        self.git.branch = Some(branch.clone());
        tracing::info!(root = %self.repo_root.display(), %branch, "repository initialised");
        Ok(GitInitOutcome::Initialized { branch })
    }

    /// Write the default `.gitignore` plus `extra` patterns unless one exists.
    /// Returns the number of pattern lines written.
    pub fn write_default_gitignore(
        &mut self,
        extra: &[String],
    ) -> Result<Option<(usize, Option<StageOutcome>)>, ToolError> {
        let path = self.repo_root.join(".gitignore");
        if path.exists() {
            return Ok(None);
        }

        let mut lines: Vec<String> = DEFAULT_GITIGNORE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        if !extra.is_empty() {
            lines.push(String::new());
            lines.push("# Custom".to_string());
            lines.extend(extra.iter().cloned());
        }
        fs::write(&path, format!("{}\n", lines.join("\n")))
            .map_err(|e| ToolError::from_io(&path, e))?;

        let staged = self.stage_if_enabled(&path);
        Ok(Some((lines.len(), staged)))
    }

    pub fn git_commit(&mut self, message: &str) -> Result<CommitOutcome, ToolError> {
        let staged = self.repo.has_staged_changes();
        if !self.guard(staged)? {
            return Ok(CommitOutcome::NothingStaged);
        }
        let result = self.repo.commit(message);
        let descriptor = self.guard(result)?;
        tracing::info!(%descriptor, "committed");
        Ok(CommitOutcome::Committed(descriptor))
    }

    /// Stage everything in the work tree, then commit.
    pub fn git_commit_all(&mut self, message: &str) -> Result<CommitOutcome, ToolError> {
        let staged = self.repo.stage_all();
        if let Err(error) = self.guard(staged) {
            if error.is_git_unavailable() {
                return Err(error);
            }
            tracing::warn!(%error, "staging all changes failed");
        }
        self.git_commit(message)
    }

    pub fn branch_exists(&mut self, name: &str) -> Result<bool, ToolError> {
        let result = self.repo.branch_exists(name);
        self.guard(result)
    }

    pub fn git_switch_branch(&mut self, name: &str) -> Result<BranchOutcome, ToolError> {
        if self.branch_exists(name)? {
            let current = self.repo.current_branch();
            if self.guard(current)?.as_deref() == Some(name) {
                return Ok(BranchOutcome::AlreadyOn(name.to_string()));
            }
            let result = self.repo.checkout(name, false);
            self.guard(result)?;
            self.git.branch = Some(name.to_string());
            return Ok(BranchOutcome::Switched(name.to_string()));
        }

        let result = self.repo.checkout(name, true);
        self.guard(result)?;
        self.git.branch = Some(name.to_string());
        Ok(BranchOutcome::Created(name.to_string()))
    }

    pub fn git_status(&mut self) -> Result<GitStatusReport, ToolError> {
        let branch = self.repo.current_branch();
        let branch = self.guard(branch)?;
        let entries = self.repo.status();
        let entries = self.guard(entries)?;
        Ok(GitStatusReport::from_entries(branch, &entries))
    }
}
