use crate::error::ToolError;
use std::fs;
use std::path::Path;

const EXCERPT_LEAD: usize = 100;
const EXCERPT_TAIL: usize = 200;
const PREFIX_PROBE_CHARS: usize = 20;

/// Replace the single occurrence of `original` in the file at `path` with `replacement`.
///
/// The file is left untouched unless `original` occurs exactly once. Overlapping
/// occurrences count separately, so `"aa"` inside `"aaa"` is ambiguous.
pub fn apply_edit(path: &Path, original: &str, replacement: &str) -> Result<String, ToolError> {
    let content = fs::read_to_string(path).map_err(|e| ToolError::from_io(path, e))?;

    if original.is_empty() {
        return Err(ToolError::MalformedArguments(
            "original_snippet must not be empty".to_string(),
        ));
    }

    match count_occurrences(&content, original) {
        0 => Err(ToolError::SnippetNotFound(path.to_path_buf())),
        1 => {
            let updated = content.replacen(original, replacement, 1);
            fs::write(path, &updated).map_err(|e| ToolError::from_io(path, e))?;
            Ok(updated)
        }
        occurrences => Err(ToolError::AmbiguousEdit {
            path: path.to_path_buf(),
            occurrences,
        }),
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let step = needle.chars().next().map_or(1, char::len_utf8);
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        start += pos + step;
    }
    count
}

/// A bounded slice of `content` around the best partial match of `snippet`.
///
/// Tries the whole snippet, then its first non-blank line, then its first 20
/// characters; with no match the excerpt starts at the top of the file.
pub fn snippet_excerpt(content: &str, snippet: &str) -> String {
    let anchor = best_partial_match(content, snippet).unwrap_or(0);

    let start = floor_char_boundary(content, anchor.saturating_sub(EXCERPT_LEAD));
    let end = ceil_char_boundary(content, start + snippet.len() + EXCERPT_TAIL);

    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push_str("...");
    }
    excerpt.push_str(&content[start..end]);
    if end < content.len() {
        excerpt.push_str("...");
    }
    excerpt
}

fn best_partial_match(content: &str, snippet: &str) -> Option<usize> {
    if snippet.is_empty() {
        return None;
    }
    if let Some(pos) = content.find(snippet) {
        return Some(pos);
    }

    if let Some(line) = snippet.lines().map(str::trim).find(|l| !l.is_empty()) {
        if let Some(pos) = content.find(line) {
            return Some(pos);
        }
    }

    let prefix: String = snippet.chars().take(PREFIX_PROBE_CHARS).collect();
    content.find(prefix.as_str())
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
