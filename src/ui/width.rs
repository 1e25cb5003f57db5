use unicode_width::UnicodeWidthChar;

/// Break `text` into rows no wider than `width` columns. Existing newlines are kept.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut line_widths = vec![0usize];
    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            lines.push(String::new());
            line_widths.push(0);
            continue;
        }
        let ch_width = char_display_width(ch);
        let current_width = *line_widths.last().unwrap_or(&0);
        if current_width + ch_width > width && current_width > 0 {
            lines.push(String::new());
            line_widths.push(0);
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        if let Some(line_width) = line_widths.last_mut() {
            *line_width += ch_width;
        }
    }
    lines
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width && used > 0 {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Cut `text` to `width` columns, ending with `...` when something was removed.
pub fn truncate_line(text: &str, width: usize) -> String {
    let width = width.max(1);
    if display_width(text) <= width {
        return text.to_string();
    }
    if width < 4 {
        return truncate_to_display_width(text, width);
    }
    let mut out = truncate_to_display_width(text, width - 3);
    out.push_str("...");
    out
}

/// Right-pad with spaces to exactly `width` columns (never truncates).
pub fn pad_to_width(text: &str, width: usize) -> String {
    let used = display_width(text);
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}
