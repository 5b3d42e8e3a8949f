use courier_config::TRUNCATION_MARKER;

/// Cap `text` at `max_chars` characters.
///
/// Longer text keeps its first `max_chars - marker` characters followed by
/// [`TRUNCATION_MARKER`], so the result is exactly `max_chars` long. Counts
/// Unicode scalar values, never splitting a character.
#[must_use]
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(0, 0)]
    #[case(3999, 3999)]
    #[case(4000, 4000)]
    #[case(4001, 4000)]
    #[case(10_000, 4000)]
    fn output_length(#[case] input_len: usize, #[case] expected_len: usize) {
        let text = "a".repeat(input_len);
        assert_eq!(truncate_reply(&text, 4000).chars().count(), expected_len);
    }

    #[test]
    fn one_over_the_limit_keeps_3990_chars_and_marker() {
        let text = "b".repeat(4001);
        let out = truncate_reply(&text, 4000);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.trim_end_matches(TRUNCATION_MARKER), "b".repeat(3990));
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_reply("Hi there!", 4000), "Hi there!");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "日本".repeat(20);
        let out = truncate_reply(&text, 15);
        assert_eq!(out.chars().count(), 15);
        assert!(out.starts_with("日本日本日"));
    }

    #[test]
    fn tiny_limit_cuts_without_marker() {
        assert_eq!(truncate_reply("abcdefghijklmnop", 4), "abcd");
    }
}
