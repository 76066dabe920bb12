//! Per-project settings
//!
//! Projects carry no configuration file of their own. The lookup exists so
//! callers have a single place to ask, and it always answers with safe
//! defaults: applies to every URL, enabled.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern that matches every URL
pub const ALL_URLS: &str = "*://*/*";

/// Settings for one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Project identifier (the directory name)
    pub name: String,
    /// Name shown to users
    pub display_name: String,
    pub description: String,
    /// URL patterns the project's scripts apply to
    pub url_patterns: Vec<String>,
    pub enabled: bool,
}

impl ProjectSettings {
    /// Look up settings for a project. Never fails.
    pub fn for_project(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            url_patterns: vec![ALL_URLS.to_string()],
            enabled: true,
        }
    }

    /// Check whether `url` is covered by any of the project's patterns.
    ///
    /// An empty pattern list covers everything.
    pub fn url_matches(&self, url: &str) -> bool {
        self.url_patterns.is_empty()
            || self
                .url_patterns
                .iter()
                .any(|pattern| url_matches_pattern(url, pattern))
    }
}

/// Match a URL against a wildcard pattern where `*` stands for any sequence
pub fn url_matches_pattern(url: &str, pattern: &str) -> bool {
    if pattern == ALL_URLS {
        return true;
    }

    let source = regex::escape(pattern).replace(r"\*", ".*");
    match Regex::new(&format!("^{}$", source)) {
        Ok(re) => re.is_match(url),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let settings = ProjectSettings::for_project("example-project");
        assert_eq!(settings.name, "example-project");
        assert_eq!(settings.display_name, "example-project");
        assert!(settings.description.is_empty());
        assert_eq!(settings.url_patterns, vec![ALL_URLS.to_string()]);
        assert!(settings.enabled);
    }

    #[rstest]
    #[case("https://example.com/page", "*://*/*", true)]
    #[case("https://example.com/page", "https://example.com/*", true)]
    #[case("https://example.org/page", "https://example.com/*", false)]
    #[case("https://exampleXcom/page", "https://example.com/*", false)]
    #[case("http://a.b.c/", "*://*.c/", true)]
    #[case("https://example.com/a?b=1", "https://example.com/a?b=1", true)]
    fn test_url_matches_pattern(#[case] url: &str, #[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(url_matches_pattern(url, pattern), expected);
    }

    #[test]
    fn test_empty_patterns_match_everything() {
        let mut settings = ProjectSettings::for_project("p");
        settings.url_patterns.clear();
        assert!(settings.url_matches("ftp://anything"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(ProjectSettings::for_project("p")).unwrap();
        assert_eq!(json["displayName"], "p");
        assert_eq!(json["urlPatterns"][0], ALL_URLS);
    }
}
