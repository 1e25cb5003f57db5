use crate::error::ToolError;
use std::fs;
use std::path::{Component, Path, PathBuf};

const WRITE_PROBE_NAME: &str = ".seek-write-test";

/// Resolves tool and command paths against a mutable base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
    startup_dir: PathBuf,
}

impl PathResolver {
    pub fn new(startup_dir: PathBuf) -> Self {
        let startup_dir = fs::canonicalize(&startup_dir).unwrap_or(startup_dir);
        Self {
            base_dir: startup_dir.clone(),
            startup_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn startup_dir(&self) -> &Path {
        &self.startup_dir
    }

    /// Absolute paths are taken as-is; relative ones join the base directory.
    /// Existing paths have their symlinks resolved.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let raw = Path::new(raw.trim());
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.base_dir.join(raw)
        };

        if let Ok(canonical) = fs::canonicalize(&joined) {
            return canonical;
        }

        let lexical = normalize_lexically(&joined);
        if let Some(ancestor) = nearest_existing_ancestor(&lexical) {
            let canonical_ancestor =
                fs::canonicalize(ancestor).unwrap_or_else(|_| ancestor.to_path_buf());
            if let Ok(rest) = lexical.strip_prefix(ancestor) {
                return canonical_ancestor.join(rest);
            }
        }
        lexical
    }

    /// Switch the base directory after checking it exists and is writable.
    pub fn set_base_dir(&mut self, raw: &str) -> Result<&Path, ToolError> {
        let candidate = self.resolve(raw);
        let metadata = fs::metadata(&candidate).map_err(|e| ToolError::from_io(&candidate, e))?;
        if !metadata.is_dir() {
            return Err(ToolError::NotFound(candidate));
        }

        let probe = candidate.join(WRITE_PROBE_NAME);
        fs::write(&probe, b"").map_err(|e| ToolError::from_io(&candidate, e))?;
        let _ = fs::remove_file(&probe);

        tracing::info!(base_dir = %candidate.display(), "base directory changed");
        self.base_dir = candidate;
        Ok(&self.base_dir)
    }

    pub fn reset(&mut self) -> &Path {
        self.base_dir = self.startup_dir.clone();
        &self.base_dir
    }
}

fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    let mut current = path;
    while !current.exists() {
        current = current.parent()?;
    }
    Some(current)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
            Component::RootDir => out.push(component.as_os_str()),
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
        }
    }
    out
}

/// True when any component of `raw` starts with `~`.
pub fn has_home_reference(raw: &str) -> bool {
    Path::new(raw).components().any(|component| {
        matches!(component, Component::Normal(seg) if seg.to_string_lossy().starts_with('~'))
    })
}
