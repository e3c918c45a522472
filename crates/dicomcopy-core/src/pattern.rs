//! Compiled name and value patterns.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How pattern strings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    /// Regular expression matched against the whole value.
    #[default]
    Regex,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Exact string equality.
    Literal,
}

impl std::fmt::Display for PatternSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regex => write!(f, "regex"),
            Self::Glob => write!(f, "glob"),
            Self::Literal => write!(f, "literal"),
        }
    }
}

/// A set of patterns; a value matches the set if it matches any member.
///
/// An empty set matches nothing.
#[derive(Debug, Clone)]
pub enum PatternSet {
    Literal(Vec<String>),
    Regex(Vec<Regex>),
    Glob(GlobSet),
}

impl PatternSet {
    /// Compile `patterns` using the given syntax.
    ///
    /// Regular expressions are anchored at both ends, so `t1sag.*` matches
    /// `t1sag_protocol` but `t1sag` does not.
    pub fn compile<S: AsRef<str>>(
        patterns: &[S],
        syntax: PatternSyntax,
    ) -> Result<Self, ConfigError> {
        match syntax {
            PatternSyntax::Literal => Ok(Self::literal(patterns)),
            PatternSyntax::Regex => {
                let mut compiled = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let pattern = pattern.as_ref();
                    let regex = Regex::new(&format!("^(?:{pattern})$"))
                        .map_err(|e| ConfigError::invalid_pattern(pattern, e))?;
                    compiled.push(regex);
                }
                Ok(Self::Regex(compiled))
            }
            PatternSyntax::Glob => {
                let mut builder = GlobSetBuilder::new();
                for pattern in patterns {
                    let pattern = pattern.as_ref();
                    let glob =
                        Glob::new(pattern).map_err(|e| ConfigError::invalid_pattern(pattern, e))?;
                    builder.add(glob);
                }
                let set = builder
                    .build()
                    .map_err(|e| ConfigError::invalid_pattern("<glob set>", e))?;
                Ok(Self::Glob(set))
            }
        }
    }

    /// Build a set that matches exactly the given strings.
    pub fn literal<S: AsRef<str>>(values: &[S]) -> Self {
        Self::Literal(values.iter().map(|v| v.as_ref().to_string()).collect())
    }

    /// Check whether `value` matches any pattern in the set.
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(values) => values.iter().any(|v| v == value),
            Self::Regex(regexes) => regexes.iter().any(|r| r.is_match(value)),
            Self::Glob(set) => set.is_match(value),
        }
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        match self {
            Self::Literal(values) => values.len(),
            Self::Regex(regexes) => regexes.len(),
            Self::Glob(set) => set.len(),
        }
    }

    /// Check if the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
