//! Core types and traits for dicomcopy.
//!
//! This crate provides the pieces shared by the traversal engine and the
//! command line: run configuration, compiled name patterns, the directory
//! classifier and the run report.

mod classify;
mod config;
mod error;
mod pattern;
mod report;

pub use classify::{DirClass, DirectoryVerdict, Filters, PathClassifier};
pub use config::{
    CopyConfig, CopyConfigBuilder, CopyConfigBuilderError, DEFAULT_FIELD, DEFAULT_FILE_NAME_PATTERN,
    DEFAULT_GLOB_FILE_NAME_PATTERN, DEFAULT_GLOB_SERIES_PATTERNS, DEFAULT_SERIES_PATTERNS,
    FilterFile, mirror_path,
};
pub use error::{ConfigError, WalkError, WalkWarning, WarningKind};
pub use pattern::{PatternSet, PatternSyntax};
pub use report::CopyReport;
