//! String utilities for the domain layer.

/// Characters that are replaced with `-` in output file names
const UNSAFE_FILENAME_CHARS: [char; 10] = ['/', '\\', ':', '*', '?', '"', '\'', '<', '>', '|'];

/// Turn a model name into a filesystem-safe token.
///
/// Path separators and shell-hostile characters become `-`, spaces become
/// `_`, everything else is kept. The mapping is one char to one char, so the
/// result is never longer than the input and applying it twice is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) {
                '-'
            } else if c == ' ' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(
            sanitize_filename("openrouter/deepseek/deepseek-r1"),
            "openrouter-deepseek-deepseek-r1"
        );
        assert_eq!(sanitize_filename(r#"a\b:c*d?e"f'g<h>i|j"#), "a-b-c-d-e-f-g-h-i-j");
        assert_eq!(sanitize_filename("my model v2"), "my_model_v2");
    }

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_filename("gpt-4.1"), "gpt-4.1");
        assert_eq!(sanitize_filename("Model_X-9.5"), "Model_X-9.5");
    }

    #[test]
    fn test_sanitize_properties() {
        let inputs = [
            "",
            "plain",
            "a/b\\c",
            "  spaced  name ",
            "q?\"<>|*:'",
            "unicode-é/ü",
            "already-safe_name.md",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {input:?}");
            assert!(once.len() <= input.len());
            assert!(!once.contains(UNSAFE_FILENAME_CHARS));
            assert!(!once.contains(' '));
        }
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "é" is two bytes; the cut must land on a char boundary
        assert_eq!(truncate("ééééé", 6), "é...");
        assert_eq!(truncate("café au lait", 64), "café au lait");
    }
}
