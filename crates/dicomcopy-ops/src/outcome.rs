//! Result of a single copy step.

use serde::{Deserialize, Serialize};

/// What happened to one node handed to a [`CopyEntry`](crate::CopyEntry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    /// The node was written; `bytes` is zero for directories.
    Copied { bytes: u64 },
    /// The destination directory already existed and was left alone.
    AlreadyPresent,
    /// Nothing was written because this is a dry run.
    Planned,
}

impl CopyOutcome {
    /// Bytes written by this step.
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Copied { bytes } => *bytes,
            Self::AlreadyPresent | Self::Planned => 0,
        }
    }
}

impl std::fmt::Display for CopyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copied { bytes } => write!(f, "copied ({bytes} bytes)"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::Planned => write!(f, "planned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes() {
        assert_eq!(CopyOutcome::Copied { bytes: 42 }.bytes(), 42);
        assert_eq!(CopyOutcome::AlreadyPresent.bytes(), 0);
        assert_eq!(CopyOutcome::Planned.bytes(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(CopyOutcome::Copied { bytes: 7 }.to_string(), "copied (7 bytes)");
        assert_eq!(CopyOutcome::AlreadyPresent.to_string(), "already present");
        assert_eq!(CopyOutcome::Planned.to_string(), "planned");
    }
}
