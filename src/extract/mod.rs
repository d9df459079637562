//! Named-capture pattern extraction over listing and detail pages.
//!
//! A [`NamedPattern`] wraps a regex whose named groups (`(?<url>...)`,
//! `(?<title>...)`, ...) become the keys of each extracted [`FieldSet`].
//! The site-specific patterns live in [`patterns`].

pub mod patterns;

use std::collections::HashMap;

use regex::Regex;

/// One match of a named pattern: group name to captured text.
///
/// Only groups that participated in the match are present.
pub type FieldSet = HashMap<String, String>;

/// A compiled regex with named capture groups.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    regex: Regex,
}

impl NamedPattern {
    /// Compiles a named-capture pattern.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Returns the underlying regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the value of `group` in the last match within `text`.
    #[must_use]
    pub fn last_value(&self, text: &str, group: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.name(group).map(|m| m.as_str().to_string()))
            .last()
    }
}

/// Produces field-sets from text using a [`NamedPattern`].
pub trait PatternExtractor: Send + Sync {
    /// Returns one [`FieldSet`] per non-overlapping match, in document order.
    fn extract(&self, text: &str, pattern: &NamedPattern) -> Vec<FieldSet>;
}

/// [`PatternExtractor`] backed directly by `regex` capture iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl PatternExtractor for RegexExtractor {
    fn extract(&self, text: &str, pattern: &NamedPattern) -> Vec<FieldSet> {
        let regex = pattern.regex();
        regex
            .captures_iter(text)
            .map(|caps| {
                regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_returns_named_groups_in_document_order() {
        let pattern = NamedPattern::new(r#"<a href="(?<url>[^"]+)">(?<title>[^<]+)</a>"#).unwrap();
        let text = r#"<a href="/one">One</a> <a href="/two">Two</a>"#;

        let sets = RegexExtractor.extract(text, &pattern);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0]["url"], "/one");
        assert_eq!(sets[0]["title"], "One");
        assert_eq!(sets[1]["url"], "/two");
    }

    #[test]
    fn test_extract_omits_non_participating_groups() {
        let pattern = NamedPattern::new(r"(?<word>[a-z]+)(?:=(?<num>\d+))?").unwrap();
        let sets = RegexExtractor.extract("alpha=1 beta", &pattern);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].get("num").map(String::as_str), Some("1"));
        assert!(!sets[1].contains_key("num"));
    }

    #[test]
    fn test_extract_no_match_is_empty() {
        let pattern = NamedPattern::new(r"(?<x>\d+)").unwrap();
        assert!(RegexExtractor.extract("no digits", &pattern).is_empty());
    }

    #[test]
    fn test_last_value_picks_final_match() {
        let pattern = NamedPattern::new(r#"data-file="(?<file>[^"]+)"#).unwrap();
        let text = r#"data-file="first" ... data-file="second""#;
        assert_eq!(pattern.last_value(text, "file").as_deref(), Some("second"));
        assert_eq!(pattern.last_value("nothing", "file"), None);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(NamedPattern::new("(?<unclosed").is_err());
    }
}
