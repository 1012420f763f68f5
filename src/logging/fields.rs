//! Field helpers for structured logging and notification text

/// Truncate text for a log field or notification body.
///
/// Cuts on a char boundary and appends `...` when anything was dropped.
///
/// # Examples
///
/// ```
/// use teamwatch::logging::truncate_preview;
///
/// assert_eq!(truncate_preview("hello", 10), "hello");
/// assert_eq!(truncate_preview("hello world", 5), "hello...");
/// ```
pub fn truncate_preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

/// Compact rendering of a frame for debug logs.
pub fn frame_preview(raw: &str) -> String {
    truncate_preview(raw, 200)
}
