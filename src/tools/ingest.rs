use crate::error::ToolError;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_FILES_PER_SCAN: usize = 1_000;
pub const MAX_FILE_SIZE_BYTES: u64 = 5_000_000;
const BINARY_SNIFF_BYTES: usize = 1024;

const EXCLUDED_NAMES: &[&str] = &[
    ".DS_Store", "Thumbs.db", ".gitignore", ".python-version", "uv.lock", ".uv", "uvenv",
    ".uvenv", ".venv", "venv", "__pycache__", ".pytest_cache", ".coverage", ".mypy_cache",
    "node_modules", "package-lock.json", "yarn.lock", "pnpm-lock.yaml", ".next", ".nuxt",
    "dist", "build", ".cache", ".parcel-cache", ".turbo", ".vercel", ".output",
    ".contentlayer", "out", "coverage", ".nyc_output", "storybook-static", ".env",
    ".env.local", ".env.development", ".env.production", ".git", ".svn", ".hg", "CVS",
];

const EXCLUDED_SUFFIXES: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".ico", ".svg", ".webp", ".avif", ".mp4", ".webm", ".mov",
    ".mp3", ".wav", ".ogg", ".zip", ".tar", ".gz", ".7z", ".rar", ".exe", ".dll", ".so",
    ".dylib", ".bin", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".pyc", ".pyo",
    ".pyd", ".egg", ".whl", ".uv", ".uvenv", ".db", ".sqlite", ".sqlite3", ".log", ".idea",
    ".vscode", ".map", ".chunk.js", ".chunk.css", ".min.js", ".min.css", ".bundle.js",
    ".bundle.css", ".cache", ".tmp", ".temp", ".ttf", ".otf", ".woff", ".woff2", ".eot",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// Accepted files with their text content, in walk order.
    pub accepted: Vec<(PathBuf, String)>,
    pub skipped: Vec<SkippedFile>,
    pub hit_limit: bool,
}

pub fn is_excluded_name(name: &str) -> bool {
    if name.starts_with('.') || EXCLUDED_NAMES.contains(&name) {
        return true;
    }
    let lowered = name.to_ascii_lowercase();
    EXCLUDED_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
}

/// Walk `root` depth-first in name order, collecting text files worth sending as context.
pub fn scan_directory(root: &Path) -> Result<DirectoryScan, ToolError> {
    let mut scan = DirectoryScan::default();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(ToolError::from_io(&dir, e)),
            Err(e) => {
                tracing::debug!(
                    dir = %dir.display(),
                    error = %e,
                    "skipping unreadable directory"
                );
                scan.skipped.push(SkippedFile {
                    path: dir,
                    reason: format!("error: {e}"),
                });
                continue;
            }
        };
        let mut children: Vec<_> = entries.filter_map(|entry| entry.ok()).collect();
        children.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for child in children {
            let path = child.path();
            let name = child.file_name().to_string_lossy().to_string();
            let Ok(file_type) = child.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if !name.starts_with('.') && !EXCLUDED_NAMES.contains(&name.as_str()) {
                    subdirs.push(path);
                }
                continue;
            }

            if scan.accepted.len() >= MAX_FILES_PER_SCAN {
                scan.hit_limit = true;
                return Ok(scan);
            }

            if is_excluded_name(&name) {
                scan.skipped.push(SkippedFile {
                    path,
                    reason: "excluded".to_string(),
                });
                continue;
            }

            match read_text_file(&path) {
                Ok(content) => {
                    let resolved = fs::canonicalize(&path).unwrap_or(path);
                    scan.accepted.push((resolved, content));
                }
                Err(reason) => scan.skipped.push(SkippedFile { path, reason }),
            }
        }

        // Reverse so the stack pops subdirectories in name order.
        stack.extend(subdirs.into_iter().rev());
    }

    tracing::debug!(
        root = %root.display(),
        accepted = scan.accepted.len(),
        skipped = scan.skipped.len(),
        "directory scanned"
    );
    Ok(scan)
}

/// Read a file as context text, or explain why it is not eligible.
pub fn read_text_file(path: &Path) -> Result<String, String> {
    let metadata = fs::metadata(path).map_err(|e| format!("error: {e}"))?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    if metadata.len() > MAX_FILE_SIZE_BYTES {
        return Err("size limit".to_string());
    }

    let bytes = fs::read(path).map_err(|e| format!("error: {e}"))?;
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sniff.contains(&0) {
        return Err("binary".to_string());
    }
    String::from_utf8(bytes).map_err(|_| "not UTF-8".to_string())
}
