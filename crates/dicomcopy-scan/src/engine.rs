//! Filtered tree replication.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dicomcopy_core::{
    ConfigError, CopyConfig, CopyReport, DirClass, DirectoryVerdict, Filters, PathClassifier,
    WalkError, WalkWarning, WarningKind, mirror_path,
};
use dicomcopy_dicom::{MetadataReader, Tag};
use dicomcopy_ops::{CopyEntry, CopyOutcome};

use crate::content::ContentFilter;
use crate::walker::{VisitFlow, Visitor, walk};

/// The decision taken for one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub path: PathBuf,
    pub target: PathBuf,
    pub class: DirClass,
    pub verdict: DirectoryVerdict,
}

/// Replicates the admitted part of a source tree onto a target root.
///
/// Every directory is classified by name before any of its children are
/// visited. Intermediate directories are always copied and entered, leaf
/// containers only when they directly hold a qualifying file, and anything
/// else is pruned with its whole subtree. Inside an entered directory every
/// file whose name is a candidate is copied; the metadata check is not
/// repeated per file.
#[derive(Debug)]
pub struct TreeWalkEngine<M, C> {
    source_root: PathBuf,
    target_root: PathBuf,
    classifier: PathClassifier,
    content: ContentFilter<M>,
    copier: C,
}

impl<M: MetadataReader, C: CopyEntry> TreeWalkEngine<M, C> {
    /// Validate the configuration and resolve both roots.
    ///
    /// This is the only place a run can fail: the source must be an existing
    /// directory, the two roots must not contain each other, the field must
    /// name a known attribute and every pattern must compile. Unless the
    /// configuration is a dry run, the parent of the target root is created.
    pub fn new(config: &CopyConfig, reader: M, copier: C) -> Result<Self, WalkError> {
        let source_root = config
            .source_root
            .canonicalize()
            .map_err(|e| WalkError::io(&config.source_root, e))?;
        if !source_root.is_dir() {
            return Err(WalkError::NotADirectory { path: source_root });
        }

        let target_root = resolve_target(&config.target_root, !config.dry_run)?;
        if target_root.starts_with(&source_root) || source_root.starts_with(&target_root) {
            return Err(WalkError::Overlap {
                source_root,
                target_root,
            });
        }

        let tag: Tag = config
            .field
            .parse()
            .map_err(|e: dicomcopy_dicom::TagParseError| ConfigError::invalid(e.to_string()))?;

        let source_name = source_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Filters {
            classifier,
            file_name,
            series,
        } = config.compile(&source_name)?;
        tracing::debug!(
            syntax = %config.pattern_syntax,
            file_name_patterns = file_name.len(),
            series_patterns = series.len(),
            "compiled filters"
        );

        Ok(Self {
            source_root,
            target_root,
            classifier,
            content: ContentFilter::new(file_name, series, reader, tag),
            copier,
        })
    }

    /// Resolved source root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Resolved target root.
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Classify a directory and decide whether to copy and enter it.
    ///
    /// Metadata failures met while qualifying a leaf are added to `report`.
    pub fn decide(&self, dir: &Path, report: &mut CopyReport) -> (DirClass, DirectoryVerdict) {
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let class = self.classifier.classify(&name);
        let verdict = match class {
            DirClass::Intermediate => DirectoryVerdict::CopyAndDescend,
            DirClass::LeafContainer if self.content.has_qualifying_content(dir, report) => {
                DirectoryVerdict::CopyAndDescend
            }
            DirClass::LeafContainer | DirClass::Other => DirectoryVerdict::SkipSubtree,
        };
        (class, verdict)
    }

    /// Walk the source tree and copy everything admitted.
    pub fn run(&self) -> CopyReport {
        self.run_observed(|_| {})
    }

    /// Like [`run`](Self::run), calling `observe` with every directory decision.
    pub fn run_observed<F: FnMut(&Decision)>(&self, observe: F) -> CopyReport {
        let start = Instant::now();
        tracing::info!(
            source = %self.source_root.display(),
            target = %self.target_root.display(),
            field = %self.content.tag(),
            "starting filtered copy"
        );

        let mut visitor = CopyVisitor {
            engine: self,
            report: CopyReport::new(),
            observe,
        };
        // The copy visitor never stops the walk.
        let _ = walk(&self.source_root, &mut visitor);

        let mut report = visitor.report;
        report.elapsed = start.elapsed();
        tracing::info!(
            %report,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "filtered copy finished"
        );
        report
    }
}

/// Absolute form of the target root, canonical as far as it exists.
fn resolve_target(target: &Path, create_parent: bool) -> Result<PathBuf, WalkError> {
    let absolute = std::path::absolute(target).map_err(|e| WalkError::io(target, e))?;
    if let Ok(canonical) = absolute.canonicalize() {
        return Ok(canonical);
    }

    let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) else {
        return Ok(absolute);
    };
    if create_parent {
        fs::create_dir_all(parent).map_err(|e| WalkError::io(parent, e))?;
    }
    Ok(match parent.canonicalize() {
        Ok(parent) => parent.join(name),
        Err(_) => absolute.clone(),
    })
}

/// Copy errors that mean the destination is already in place.
fn is_already_in_place(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::AlreadyExists | io::ErrorKind::DirectoryNotEmpty
    )
}

struct CopyVisitor<'a, M, C, F> {
    engine: &'a TreeWalkEngine<M, C>,
    report: CopyReport,
    observe: F,
}

impl<M, C, F> CopyVisitor<'_, M, C, F>
where
    M: MetadataReader,
    C: CopyEntry,
    F: FnMut(&Decision),
{
    fn mirror(&mut self, path: &Path) -> Option<PathBuf> {
        let target = mirror_path(&self.engine.source_root, &self.engine.target_root, path);
        if target.is_none() {
            self.report.warn(WalkWarning::new(
                path,
                "Not under the source root",
                WarningKind::VisitFailed,
            ));
        }
        target
    }

    fn record_outcome(&mut self, outcome: CopyOutcome, target: &Path) {
        self.report.add_bytes(outcome.bytes());
        if outcome == CopyOutcome::Planned {
            self.report.record_planned(target.to_path_buf());
        }
    }

    /// Copy a directory node; false when the subtree must be pruned.
    fn copy_dir(&mut self, dir: &Path, target: &Path) -> bool {
        match self.engine.copier.copy_dir(dir, target) {
            Ok(outcome) => {
                self.record_outcome(outcome, target);
                true
            }
            Err(e) if is_already_in_place(&e) => true,
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    target = %target.display(),
                    error = %e,
                    "unable to copy directory"
                );
                self.report.warn(WalkWarning::copy_failed(dir, target, &e));
                false
            }
        }
    }
}

impl<M, C, F> Visitor for CopyVisitor<'_, M, C, F>
where
    M: MetadataReader,
    C: CopyEntry,
    F: FnMut(&Decision),
{
    fn pre_visit_directory(&mut self, dir: &Path) -> VisitFlow {
        let Some(target) = self.mirror(dir) else {
            return VisitFlow::Skip;
        };

        let (class, mut verdict) = self.engine.decide(dir, &mut self.report);
        if verdict.descends() && !self.copy_dir(dir, &target) {
            verdict = DirectoryVerdict::SkipSubtree;
        }
        self.report.record_dir(verdict.descends());
        tracing::debug!(path = %dir.display(), %class, ?verdict, "directory");

        (self.observe)(&Decision {
            path: dir.to_path_buf(),
            target,
            class,
            verdict,
        });

        if verdict.descends() {
            VisitFlow::Enter
        } else {
            VisitFlow::Skip
        }
    }

    fn visit_file(&mut self, file: &Path) -> VisitFlow {
        let is_candidate = file
            .file_name()
            .is_some_and(|name| self.engine.content.is_candidate(&name.to_string_lossy()));
        if !is_candidate {
            tracing::trace!(path = %file.display(), "not a candidate");
            self.report.record_file(false);
            return VisitFlow::Enter;
        }
        let Some(target) = self.mirror(file) else {
            self.report.record_file(false);
            return VisitFlow::Enter;
        };

        match self.engine.copier.copy_file(file, &target) {
            Ok(outcome) => {
                tracing::debug!(path = %file.display(), %outcome, "file");
                self.report.record_file(true);
                self.record_outcome(outcome, &target);
            }
            Err(e) if is_already_in_place(&e) => self.report.record_file(true),
            Err(e) => {
                tracing::warn!(
                    path = %file.display(),
                    target = %target.display(),
                    error = %e,
                    "unable to copy file"
                );
                self.report.warn(WalkWarning::copy_failed(file, &target, &e));
                self.report.record_file_failed();
            }
        }
        VisitFlow::Enter
    }

    fn visit_file_failed(&mut self, path: &Path, error: &io::Error) -> VisitFlow {
        tracing::warn!(path = %path.display(), error = %error, "unable to visit");
        self.report.warn(WalkWarning::visit_failed(path, error));
        VisitFlow::Enter
    }

    /// Only entered, and so admitted, directories are post-visited.
    fn post_visit_directory(&mut self, dir: &Path, error: Option<&io::Error>) -> VisitFlow {
        if let Some(e) = error {
            tracing::warn!(path = %dir.display(), error = %e, "error while listing directory");
            self.report.warn(WalkWarning::read_error(dir, e));
        }

        // Copying children bumps the directory's mtime; restore it last.
        let Some(target) = self.mirror(dir) else {
            return VisitFlow::Enter;
        };
        if let Err(e) = self.engine.copier.finish_dir(dir, &target) {
            tracing::warn!(
                path = %dir.display(),
                target = %target.display(),
                error = %e,
                "unable to restore directory metadata"
            );
            self.report.warn(WalkWarning::copy_failed(dir, &target, &e));
        }
        VisitFlow::Enter
    }
}
