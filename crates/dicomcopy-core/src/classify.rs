//! Structural classification of directories by name.

use serde::{Deserialize, Serialize};

use crate::pattern::PatternSet;

/// Structural role of a directory, derived from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirClass {
    /// Part of the allowed path; copied and entered unconditionally.
    Intermediate,
    /// Expected to hold image files; admitted only with qualifying content.
    LeafContainer,
    /// Anything else; the whole subtree is pruned.
    Other,
}

impl std::fmt::Display for DirClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intermediate => write!(f, "intermediate"),
            Self::LeafContainer => write!(f, "leaf"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Outcome of a directory visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryVerdict {
    CopyAndDescend,
    SkipSubtree,
}

impl DirectoryVerdict {
    /// Check if the walk should enter the directory.
    pub fn descends(&self) -> bool {
        matches!(self, Self::CopyAndDescend)
    }
}

/// Maps directory names to a [`DirClass`].
///
/// The root name slot and the intermediate slot are kept apart so either can
/// be configured or tested on its own; both produce
/// [`DirClass::Intermediate`].
#[derive(Debug, Clone)]
pub struct PathClassifier {
    root_name: PatternSet,
    intermediate: PatternSet,
    leaf: PatternSet,
}

impl PathClassifier {
    /// Create a classifier from compiled pattern sets.
    pub fn new(root_name: PatternSet, intermediate: PatternSet, leaf: PatternSet) -> Self {
        Self {
            root_name,
            intermediate,
            leaf,
        }
    }

    /// Classify a directory by its own name.
    ///
    /// Intermediate wins when a name also matches the leaf pattern.
    pub fn classify(&self, dir_name: &str) -> DirClass {
        if self.is_root_name(dir_name) || self.intermediate.is_match(dir_name) {
            DirClass::Intermediate
        } else if self.leaf.is_match(dir_name) {
            DirClass::LeafContainer
        } else {
            DirClass::Other
        }
    }

    /// Check the root name slot only.
    pub fn is_root_name(&self, dir_name: &str) -> bool {
        self.root_name.is_match(dir_name)
    }
}

/// Every compiled pattern a run needs.
#[derive(Debug, Clone)]
pub struct Filters {
    /// Directory classifier.
    pub classifier: PathClassifier,
    /// Candidate image file names.
    pub file_name: PatternSet,
    /// Accepted field values.
    pub series: PatternSet,
}
