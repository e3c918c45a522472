//! Content qualification of leaf container directories.

use std::path::Path;

use dicomcopy_core::{CopyReport, PatternSet, WalkWarning};
use dicomcopy_dicom::{MetadataReader, ParseError, Tag};

use crate::walker::any_entry;

/// Result of inspecting one file's metadata field.
#[derive(Debug)]
pub enum MetadataField {
    /// The field was read.
    Value(String),
    /// The file name is not a candidate, so nothing was read.
    NotApplicable,
    /// The file could not be parsed or lacks the field.
    Failed(ParseError),
}

/// Decides whether a directory directly holds at least one qualifying file.
///
/// A file qualifies when its name is a candidate and its metadata field
/// matches one of the accepted series patterns.
#[derive(Debug)]
pub struct ContentFilter<M> {
    file_name: PatternSet,
    series: PatternSet,
    reader: M,
    tag: Tag,
}

impl<M: MetadataReader> ContentFilter<M> {
    /// Create a filter reading `tag` through `reader`.
    pub fn new(file_name: PatternSet, series: PatternSet, reader: M, tag: Tag) -> Self {
        Self {
            file_name,
            series,
            reader,
            tag,
        }
    }

    /// The attribute being inspected.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Check if a file name marks a candidate image file.
    pub fn is_candidate(&self, file_name: &str) -> bool {
        self.file_name.is_match(file_name)
    }

    /// Read the field of one file if its name is a candidate.
    pub fn inspect(&self, path: &Path) -> MetadataField {
        let is_candidate = path
            .file_name()
            .is_some_and(|name| self.is_candidate(&name.to_string_lossy()));
        if !is_candidate {
            return MetadataField::NotApplicable;
        }

        match self.reader.read_field(path, self.tag) {
            Ok(value) => MetadataField::Value(value),
            Err(e) => MetadataField::Failed(e),
        }
    }

    /// Check if `dir` directly contains a qualifying file.
    ///
    /// Stops reading at the first qualifying file. Unreadable files are
    /// recorded in `report` and skipped; a listing failure is recorded and
    /// makes the directory non-qualifying.
    pub fn has_qualifying_content(&self, dir: &Path, report: &mut CopyReport) -> bool {
        let scan = any_entry(dir, |path| {
            if !path.is_file() {
                return false;
            }
            match self.inspect(path) {
                MetadataField::Value(value) => {
                    let wanted = self.series.is_match(&value);
                    tracing::trace!(path = %path.display(), %value, wanted, "inspected");
                    wanted
                }
                MetadataField::NotApplicable => false,
                MetadataField::Failed(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unable to read metadata");
                    report.warn(WalkWarning::metadata(path, &e));
                    false
                }
            }
        });

        match scan {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "unable to list directory");
                report.warn(WalkWarning::read_error(dir, &e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicomcopy_core::PatternSyntax;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Reads the file body as the field value; `!` prefix means corrupt.
    struct BodyReader;

    impl MetadataReader for BodyReader {
        fn read_field(&self, path: &Path, tag: Tag) -> Result<String, ParseError> {
            let body = fs::read_to_string(path).map_err(ParseError::Io)?;
            if body.starts_with('!') {
                return Err(ParseError::NotDicom("corrupt".to_string()));
            }
            if body.is_empty() {
                return Err(ParseError::TagAbsent(tag));
            }
            Ok(body)
        }
    }

    fn filter() -> ContentFilter<BodyReader> {
        ContentFilter::new(
            PatternSet::compile(&[r"i\d+\.MRDC\.\d+"], PatternSyntax::Regex).unwrap(),
            PatternSet::compile(&["t1sag.*", "t2flairsag.*"], PatternSyntax::Regex).unwrap(),
            BodyReader,
            Tag::SERIES_DESCRIPTION,
        )
    }

    fn series_dir(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("s1");
        fs::create_dir(&dir).unwrap();
        for (name, body) in files {
            fs::write(dir.join(name), body).unwrap();
        }
        (temp, dir)
    }

    #[test]
    fn test_one_match_is_enough() {
        let (_temp, dir) = series_dir(&[
            ("i1.MRDC.1", "t1sag_protocol"),
            ("i2.MRDC.2", "other_protocol"),
        ]);
        let mut report = CopyReport::new();
        assert!(filter().has_qualifying_content(&dir, &mut report));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_no_match() {
        let (_temp, dir) = series_dir(&[
            ("i1.MRDC.1", "other_protocol"),
            ("i2.MRDC.2", "localizer"),
        ]);
        let mut report = CopyReport::new();
        assert!(!filter().has_qualifying_content(&dir, &mut report));
    }

    #[test]
    fn test_non_candidate_names_ignored() {
        let (_temp, dir) = series_dir(&[("notes.txt", "t1sag_protocol")]);
        let mut report = CopyReport::new();
        assert!(!filter().has_qualifying_content(&dir, &mut report));
        assert_eq!(report.metadata_failures, 0);
    }

    #[test]
    fn test_corrupt_file_does_not_block() {
        let (_temp, dir) = series_dir(&[("i1.MRDC.1", "!garbage"), ("i2.MRDC.2", "t2flairsag")]);
        let mut report = CopyReport::new();
        assert!(filter().has_qualifying_content(&dir, &mut report));
    }

    #[test]
    fn test_corrupt_only_is_recorded() {
        let (_temp, dir) = series_dir(&[("i1.MRDC.1", "!garbage"), ("i2.MRDC.2", "")]);
        let mut report = CopyReport::new();
        assert!(!filter().has_qualifying_content(&dir, &mut report));
        assert_eq!(report.metadata_failures, 2);
    }

    #[test]
    fn test_listing_failure_is_non_qualifying() {
        let temp = TempDir::new().unwrap();
        let mut report = CopyReport::new();
        assert!(!filter().has_qualifying_content(&temp.path().join("gone"), &mut report));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_inspect() {
        let (_temp, dir) = series_dir(&[("i1.MRDC.1", "t1sag"), ("other", "t1sag")]);
        let filter = filter();
        assert!(matches!(
            filter.inspect(&dir.join("i1.MRDC.1")),
            MetadataField::Value(v) if v == "t1sag"
        ));
        assert!(matches!(filter.inspect(&dir.join("other")), MetadataField::NotApplicable));
        assert!(matches!(
            filter.inspect(&dir.join("i9.MRDC.9")),
            MetadataField::Failed(ParseError::Io(_))
        ));
    }
}
