//! Depth-first filtered copy engine for dicomcopy.
//!
//! This crate walks a study tree once, deciding for every directory before
//! its children are visited whether to copy and enter it or to prune it.
//!
//! # Overview
//!
//! - [`walk`] drives a [`Visitor`] depth-first over a directory tree
//! - [`ContentFilter`] checks whether a directory directly holds a file whose
//!   metadata field matches the wanted series
//! - [`TreeWalkEngine`] combines name classification, content filtering and a
//!   [`CopyEntry`](dicomcopy_ops::CopyEntry) into one run
//!
//! # Example
//!
//! ```rust,no_run
//! use dicomcopy_core::CopyConfig;
//! use dicomcopy_dicom::DicomReader;
//! use dicomcopy_ops::FsCopier;
//! use dicomcopy_scan::TreeWalkEngine;
//!
//! let config = CopyConfig::new("/data/study", "/data/filtered", r"s\d+");
//! let engine = TreeWalkEngine::new(&config, DicomReader::new(), FsCopier::new()).unwrap();
//! let report = engine.run();
//!
//! println!("Copied {} files", report.files_copied);
//! ```

mod content;
mod engine;
mod walker;

pub use content::{ContentFilter, MetadataField};
pub use engine::{Decision, TreeWalkEngine};
pub use walker::{VisitFlow, Visitor, any_entry, walk};

// Re-export core types for convenience
pub use dicomcopy_core::{
    CopyConfig, CopyReport, DirClass, DirectoryVerdict, WalkError, WalkWarning, WarningKind,
};
