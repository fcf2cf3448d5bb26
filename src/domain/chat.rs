pub const MAX_MESSAGE_LEN: usize = 1000;

/// Escapes `<` and `>` so forwarded text cannot carry markup.
/// Applied exactly once, on the forward path.
pub fn escape_markup(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Bounds-checks and escapes an outgoing chat message.
/// Returns `None` for over-length text, which is dropped silently.
pub fn sanitize_message(text: &str) -> Option<String> {
    if text.chars().count() > MAX_MESSAGE_LEN {
        return None;
    }
    Some(escape_markup(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_angle_brackets() {
        assert_eq!(escape_markup("<script>"), "&lt;script&gt;");
        assert_eq!(escape_markup("a < b > c"), "a &lt; b &gt; c");
    }

    #[test]
    fn already_escaped_text_is_untouched() {
        assert_eq!(escape_markup("&lt;script&gt;"), "&lt;script&gt;");
    }

    #[test]
    fn drops_over_length_messages() {
        assert!(sanitize_message(&"x".repeat(MAX_MESSAGE_LEN + 1)).is_none());
        assert!(sanitize_message(&"x".repeat(MAX_MESSAGE_LEN)).is_some());
    }
}
