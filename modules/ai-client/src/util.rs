use regex::Regex;
use std::sync::LazyLock;

static FIRST_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]+\}").unwrap());

/// Longest prefix of `s` that fits in `max_bytes` without splitting a character.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(start, c)| start + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// Locate the first flat brace-delimited object in free-form model output.
///
/// Models wrap JSON in prose or code fences; this returns the span from the
/// first `{` up to the next `}`. Nested objects are not supported.
pub fn first_json_object(text: &str) -> Option<&str> {
    FIRST_OBJECT_RE.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_backs_off_multibyte_char() {
        // 'é' spans bytes 1..3, so a two-byte budget keeps only the 'h'.
        assert_eq!(truncate_to_char_boundary("héllo", 2), "h");
        assert_eq!(truncate_to_char_boundary("héllo", 3), "hé");
        assert_eq!(truncate_to_char_boundary("ab🙂", 5), "ab");
    }

    #[test]
    fn test_truncate_short_input_is_whole() {
        assert_eq!(truncate_to_char_boundary("score: 7", 64), "score: 7");
        assert_eq!(truncate_to_char_boundary("", 4), "");
        assert_eq!(truncate_to_char_boundary("abc", 0), "");
    }

    #[test]
    fn test_first_json_object_in_prose() {
        let text = "Sure! Here is the result:\n```json\n{\"informativeness\": 3, \"category\": \"activity\"}\n```";
        assert_eq!(
            first_json_object(text),
            Some("{\"informativeness\": 3, \"category\": \"activity\"}")
        );
    }

    #[test]
    fn test_first_json_object_missing() {
        assert_eq!(first_json_object("no json here"), None);
        assert_eq!(first_json_object("{}"), None);
    }

    #[test]
    fn test_first_json_object_takes_first() {
        let text = r#"{"a": 1} and then {"b": 2}"#;
        assert_eq!(first_json_object(text), Some(r#"{"a": 1}"#));
    }
}
