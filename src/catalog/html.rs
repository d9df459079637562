//! HTML entity normalization for titles and thumbnail URLs.

/// Replaces the HTML entities the site emits in attribute and text values.
///
/// `&amp;` is replaced last so double-escaped input (`&amp;lt;`) only loses
/// one level of escaping.
#[must_use]
pub fn unescape_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&nbsp;", "\u{00a0}")
        .replace("&#160;", "\u{00a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_amp_in_thumbnail_query() {
        assert_eq!(
            unescape_entities("https://img.vier.be/a.jpg?w=1&amp;h=2"),
            "https://img.vier.be/a.jpg?w=1&h=2"
        );
    }

    #[test]
    fn test_unescape_text_entities() {
        assert_eq!(
            unescape_entities("&quot;Tom &amp; Jerry&quot; &ndash; De&#39;s"),
            "\"Tom & Jerry\" \u{2013} De's"
        );
    }

    #[test]
    fn test_unescape_double_escaped_only_one_level() {
        assert_eq!(unescape_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unescape_plain_value_unchanged() {
        assert_eq!(unescape_entities("plain"), "plain");
    }
}
