//! Path component sanitization for titles, part names and author names.
//!
//! Titles come straight from the platform and may contain anything, so every
//! path component derived from them goes through [`sanitize_filename`].

/// Characters that are invalid in Windows filenames
const WINDOWS_INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Windows reserved filenames (case-insensitive)
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Upper bound in bytes for one sanitized component, leaving room for the
/// quality suffix and extension under the common 255-byte limit.
pub const MAX_COMPONENT_BYTES: usize = 200;

/// Sanitize a string for use as a single path component.
///
/// Invalid and control characters become `_` (runs collapse to one), leading
/// and trailing spaces and dots are trimmed, reserved Windows names get a `_`
/// prefix, and the result is cut to [`MAX_COMPONENT_BYTES`] on a char boundary.
/// An empty result becomes `"unnamed"`.
pub fn sanitize_filename(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_was_replacement = false;

    for c in input.chars() {
        if c.is_control() || WINDOWS_INVALID_CHARS.contains(&c) {
            if !last_was_replacement {
                result.push('_');
                last_was_replacement = true;
            }
        } else {
            result.push(c);
            last_was_replacement = false;
        }
    }

    let truncated = truncate_on_char_boundary(&result, MAX_COMPONENT_BYTES);
    let trimmed = truncated.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        return "unnamed".to_string();
    }

    let upper = trimmed.to_uppercase();
    let stem = upper.split('.').next().unwrap_or_default();
    if WINDOWS_RESERVED_NAMES.contains(&stem) {
        return format!("_{trimmed}");
    }

    trimmed.to_string()
}

fn truncate_on_char_boundary(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_only_invalid() {
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename("..."), "unnamed");
        assert_eq!(sanitize_filename("???"), "_");
    }

    #[test]
    fn test_windows_reserved_names() {
        assert_eq!(sanitize_filename("CON"), "_CON");
        assert_eq!(sanitize_filename("nul.mp4"), "_nul.mp4");
        assert_eq!(sanitize_filename("CONSOLE"), "CONSOLE");
    }

    #[test]
    fn test_titles() {
        assert_eq!(sanitize_filename("【4K】春/夏?"), "【4K】春_夏_");
        assert_eq!(sanitize_filename("a<>:\"b"), "a_b");
        assert_eq!(sanitize_filename("  P1 开场. "), "P1 开场");
        assert_eq!(sanitize_filename("line\nbreak"), "line_break");
    }

    #[test]
    fn test_truncation_keeps_char_boundary() {
        let long = "测".repeat(100);
        let out = sanitize_filename(&long);
        assert!(out.len() <= MAX_COMPONENT_BYTES);
        assert!(out.chars().all(|c| c == '测'));
    }

    #[test]
    fn test_idempotency() {
        for input in ["hello?world", "观看一只青蛙?", "CON", "  test  ", "...dots..."] {
            let once = sanitize_filename(input);
            assert_eq!(once, sanitize_filename(&once), "input: {input}");
        }
    }
}
