//! Markdown code-fence unwrapping.

const FENCE: &str = "```";

/// Extract the payload of the first fenced block in `response`.
///
/// Handles language-tagged (```` ```json ````) and bare fences. A fence that
/// is never closed (a truncated response) yields everything after the
/// opening line. Text without a fence is returned unchanged.
///
/// # Examples
///
/// ```
/// use fabula_models::unwrap_fenced;
///
/// let payload = r#"{"start_scene":"scene_1"}"#;
/// let fenced = format!("Here you go:\n```json\n{}\n```\nEnjoy!", payload);
///
/// assert_eq!(unwrap_fenced(&fenced), payload);
/// assert_eq!(unwrap_fenced(payload), payload);
/// ```
pub fn unwrap_fenced(response: &str) -> &str {
    let Some(start) = response.find(FENCE) else {
        return response;
    };
    let after_fence = start + FENCE.len();

    // Skip a language tag when the opening line carries nothing else
    let line_end = response[after_fence..]
        .find('\n')
        .map(|n| after_fence + n)
        .unwrap_or(response.len());
    let tag = &response[after_fence..line_end];
    let content_start = if is_language_tag(tag) {
        (line_end + 1).min(response.len())
    } else {
        after_fence
    };

    match response[content_start..].find(FENCE) {
        Some(end) => response[content_start..content_start + end].trim(),
        None => response[content_start..].trim(),
    }
}

fn is_language_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}
