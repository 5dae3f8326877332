//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile route patterns into anchored regular expressions
//! - Test request paths against a pattern
//! - Extract capture groups into an ordered `PathMatch`
//!
//! # Design Decisions
//! - Anchoring is implicit: the whole path must match, never a prefix or substring
//! - Captures are positional; unmatched optional groups become empty strings
//! - Matching is case-sensitive

use std::fmt;

use regex::Regex;

/// A compiled, fully anchored path pattern.
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile `pattern`, anchoring it at both ends.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as registered, without the implicit anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `path` matches this pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and collect its captures, or `None` if it does not match.
    pub fn captures(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let params = caps
            .iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect();
        Some(PathMatch { params })
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.source).finish()
    }
}

/// Captured substrings of a matched path, in capture-group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    params: Vec<String>,
}

impl PathMatch {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn param(&self, index: usize) -> &str {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "path parameter {index} requested but the route only captures {}",
                self.params.len()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
