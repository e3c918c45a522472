//! Parse failures.

use thiserror::Error;

use crate::tag::Tag;

/// Why an attribute could not be read from a file.
///
/// Errors carry no path; callers attach it when reporting.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// The file does not look like a DICOM dataset at all.
    #[error("Not a DICOM file: {0}")]
    NotDicom(String),

    /// The dataset uses an encoding this reader does not decode.
    #[error("Unsupported transfer syntax {0}")]
    UnsupportedTransferSyntax(String),

    /// The data ended inside an element.
    #[error("Unexpected end of data")]
    Truncated,

    /// An element header or value is inconsistent.
    #[error("Malformed element {tag}: {reason}")]
    Malformed { tag: Tag, reason: String },

    /// The dataset is valid but has no such attribute.
    #[error("Attribute {0} not present")]
    TagAbsent(Tag),
}

impl ParseError {
    pub(crate) fn malformed(tag: Tag, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tag,
            reason: reason.into(),
        }
    }

    /// Check if the file parsed but simply lacks the attribute.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::TagAbsent(_))
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::Truncated,
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_truncated() {
        let err: ParseError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, ParseError::Truncated));

        let err: ParseError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_absent_display() {
        let err = ParseError::TagAbsent(Tag::SERIES_DESCRIPTION);
        assert!(err.is_absent());
        assert_eq!(err.to_string(), "Attribute (0008,103E) not present");
    }
}
