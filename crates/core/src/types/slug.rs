//! URL-safe identifiers derived from titles.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Everything that is not a word character, whitespace, or hyphen.
///
/// Applied after lowercasing, so `[a-z0-9_]` covers the ASCII word class.
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9_\s-]").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|e| unreachable!("static pattern: {e}")));

/// A blog post slug.
///
/// Derived once from the title when a post is created and never recomputed.
/// No uniqueness is implied by the type; collisions are checked by the
/// caller before insert.
///
/// ```
/// use micrart_core::Slug;
///
/// assert_eq!(Slug::from_title("My Carving!").as_str(), "my-carving");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a title.
    ///
    /// Steps, in order: lowercase, trim, strip characters outside
    /// `[\w\s-]`, replace each whitespace run with a single hyphen.
    #[must_use]
    pub fn from_title(title: &str) -> Self {
        let lowered = title.to_lowercase();
        let stripped = DISALLOWED.replace_all(lowered.trim(), "");
        Self(WHITESPACE_RUN.replace_all(&stripped, "-").into_owned())
    }

    /// Wrap a slug taken from a URL path segment.
    #[must_use]
    pub fn from_path(segment: &str) -> Self {
        Self(segment.to_string())
    }

    /// Get the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the title produced no usable characters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim_matches('-').is_empty()
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
