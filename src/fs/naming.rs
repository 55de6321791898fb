//! Filename generation and manipulation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Longest path component we generate, in characters.
const MAX_COMPONENT_CHARS: usize = 120;

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Turn a course, chapter or lecture title into a path component.
///
/// Titles come from course authors, so separators and reserved characters
/// are replaced rather than rejected. Runs of whitespace collapse to one
/// space, and leading dots are stripped so no component is hidden or
/// resolves to `..`.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = whitespace_run().replace_all(&replaced, " ");
    let trimmed = collapsed.trim().trim_start_matches('.').trim();
    let truncated: String = trimmed.chars().take(MAX_COMPONENT_CHARS).collect();
    let truncated = truncated.trim_end().to_string();

    if truncated.is_empty() {
        return Err(Error::InvalidFilename(format!(
            "Path component cannot be empty: '{}'",
            name
        )));
    }

    Ok(truncated)
}

/// Prefix a title with its 1-based position, e.g. `03 - Closures`.
///
/// Untitled entries fall back to their number alone.
pub fn numbered_component(index: usize, title: &str) -> String {
    match sanitize_path_component(title) {
        Ok(title) => format!("{:02} - {}", index, title),
        Err(_) => format!("{:02}", index),
    }
}

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}
