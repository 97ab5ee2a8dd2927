/// Truncate an upstream error body for logs and issue comments.
pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Whether a GitHub status means "resource does not exist" rather than failure.
pub fn is_not_found_status(status: u16) -> bool {
    status == 404
}
