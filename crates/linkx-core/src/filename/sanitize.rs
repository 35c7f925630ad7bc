//! Local filesystem name sanitization.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Turns an untrusted name into a single path component.
///
/// Path separators, NUL and control characters become `_`. Leading dots and
/// surrounding whitespace are stripped so the result is never hidden,
/// relative (`..`) or empty-looking. Returns `None` when nothing usable is
/// left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced
        .trim()
        .trim_start_matches('.')
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_start();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return None;
    }

    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    Some(trimmed[..end].to_string())
}
