use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Item descriptions arrive as free text from the upload form and are later
/// rendered by the web client. Sanitizing on the way in keeps stored
/// descriptions safe to show anywhere, even if a client forgets to escape.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags_but_keeps_text() {
        let cleaned = clean_html("Warm jacket <script>alert(1)</script>for winter");
        assert!(!cleaned.contains("<script>"));
        assert!(cleaned.contains("Warm jacket"));
        assert!(cleaned.contains("for winter"));
    }

    #[test]
    fn keeps_harmless_formatting() {
        let cleaned = clean_html("Barely worn, <em>great</em> condition");
        assert!(cleaned.contains("<em>great</em>"));
    }
}
