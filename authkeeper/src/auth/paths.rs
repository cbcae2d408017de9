//! Paths exempt from authentication.

use serde::{Deserialize, Serialize};

/// Normalize a path so that it ends in exactly one `/`.
fn with_trailing_slash(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Prefix(String),
}

/// Ordered set of excluded path patterns.
///
/// An entry matches a request path when both are equal after trailing-slash normalization, so
/// `/status` and `/status/` are the same path. An entry ending in `*` matches every path that
/// starts with the text before the `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExcludedPaths {
    raw: Vec<String>,
    patterns: Vec<PathPattern>,
}

impl ExcludedPaths {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = entries.into_iter().map(Into::into).collect();
        let patterns = raw
            .iter()
            .map(|entry| match entry.strip_suffix('*') {
                Some(prefix) => PathPattern::Prefix(prefix.to_string()),
                None => PathPattern::Exact(with_trailing_slash(entry)),
            })
            .collect();
        Self { raw, patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let normalized = with_trailing_slash(path);
        self.patterns.iter().any(|pattern| match pattern {
            PathPattern::Exact(entry) => *entry == normalized,
            PathPattern::Prefix(prefix) => normalized.starts_with(prefix.as_str()),
        })
    }

    /// Whether a request to `path` must carry a credential.
    ///
    /// No path, or nothing excluded, means no authentication is demanded.
    pub fn require_auth(&self, path: Option<&str>) -> bool {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return false;
        };
        if self.is_empty() {
            return false;
        }
        !self.matches(path)
    }
}

impl From<Vec<String>> for ExcludedPaths {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<ExcludedPaths> for Vec<String> {
    fn from(paths: ExcludedPaths) -> Self {
        paths.raw
    }
}
