//! Copy primitives for dicomcopy.
//!
//! This crate copies single directory and file nodes while preserving
//! permissions and timestamps. Callers drive the traversal.

mod copy;
mod outcome;

pub use copy::{CopyEntry, DryRunCopier, FsCopier};
pub use outcome::CopyOutcome;
