//! Attribute tags and the keyword dictionary.

use std::str::FromStr;

use thiserror::Error;

/// A DICOM attribute tag `(group,element)`.
///
/// Ordering follows the on-disk ordering of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    pub const TRANSFER_SYNTAX_UID: Tag = Tag::new(0x0002, 0x0010);
    pub const SPECIFIC_CHARACTER_SET: Tag = Tag::new(0x0008, 0x0005);
    pub const IMAGE_TYPE: Tag = Tag::new(0x0008, 0x0008);
    pub const SOP_CLASS_UID: Tag = Tag::new(0x0008, 0x0016);
    pub const MODALITY: Tag = Tag::new(0x0008, 0x0060);
    pub const STUDY_DESCRIPTION: Tag = Tag::new(0x0008, 0x1030);
    pub const SERIES_DESCRIPTION: Tag = Tag::new(0x0008, 0x103E);
    pub const PATIENT_NAME: Tag = Tag::new(0x0010, 0x0010);
    pub const PATIENT_ID: Tag = Tag::new(0x0010, 0x0020);
    pub const BODY_PART_EXAMINED: Tag = Tag::new(0x0018, 0x0015);
    pub const SEQUENCE_NAME: Tag = Tag::new(0x0018, 0x0024);
    pub const PROTOCOL_NAME: Tag = Tag::new(0x0018, 0x1030);
    pub const STUDY_INSTANCE_UID: Tag = Tag::new(0x0020, 0x000D);
    pub const SERIES_INSTANCE_UID: Tag = Tag::new(0x0020, 0x000E);
    pub const SERIES_NUMBER: Tag = Tag::new(0x0020, 0x0011);

    pub(crate) const ITEM: Tag = Tag::new(0xFFFE, 0xE000);
    pub(crate) const ITEM_DELIMITATION: Tag = Tag::new(0xFFFE, 0xE00D);
    pub(crate) const SEQUENCE_DELIMITATION: Tag = Tag::new(0xFFFE, 0xE0DD);

    /// Create a tag.
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Look up a tag by dictionary keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        DICTIONARY
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(keyword))
            .map(|(_, tag)| *tag)
    }

    /// Dictionary keyword for this tag, if known.
    pub fn keyword(&self) -> Option<&'static str> {
        DICTIONARY
            .iter()
            .find(|(_, tag)| tag == self)
            .map(|(name, _)| *name)
    }

    /// Check if this is an item or delimitation tag.
    pub(crate) fn is_delimiter_group(&self) -> bool {
        self.group == 0xFFFE
    }
}

const DICTIONARY: &[(&str, Tag)] = &[
    ("TransferSyntaxUID", Tag::TRANSFER_SYNTAX_UID),
    ("SpecificCharacterSet", Tag::SPECIFIC_CHARACTER_SET),
    ("ImageType", Tag::IMAGE_TYPE),
    ("SOPClassUID", Tag::SOP_CLASS_UID),
    ("Modality", Tag::MODALITY),
    ("StudyDescription", Tag::STUDY_DESCRIPTION),
    ("SeriesDescription", Tag::SERIES_DESCRIPTION),
    ("PatientName", Tag::PATIENT_NAME),
    ("PatientID", Tag::PATIENT_ID),
    ("BodyPartExamined", Tag::BODY_PART_EXAMINED),
    ("SequenceName", Tag::SEQUENCE_NAME),
    ("ProtocolName", Tag::PROTOCOL_NAME),
    ("StudyInstanceUID", Tag::STUDY_INSTANCE_UID),
    ("SeriesInstanceUID", Tag::SERIES_INSTANCE_UID),
    ("SeriesNumber", Tag::SERIES_NUMBER),
];

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

/// A string that is neither a known keyword nor a `gggg,eeee` tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown attribute `{0}`: expected a keyword such as SeriesDescription or a tag like 0008,103E")]
pub struct TagParseError(pub String);

impl FromStr for Tag {
    type Err = TagParseError;

    /// Accepts `SeriesDescription`, `0008,103E`, `(0008,103E)` or `0008103E`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(tag) = Self::from_keyword(trimmed) {
            return Ok(tag);
        }

        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let (group, element) = match inner.split_once(',') {
            Some((g, e)) => (g.trim(), e.trim()),
            None if inner.len() == 8 && inner.is_ascii() => inner.split_at(4),
            None => return Err(TagParseError(s.to_string())),
        };
        if group.len() != 4 || element.len() != 4 {
            return Err(TagParseError(s.to_string()));
        }

        let group = u16::from_str_radix(group, 16).map_err(|_| TagParseError(s.to_string()))?;
        let element =
            u16::from_str_radix(element, 16).map_err(|_| TagParseError(s.to_string()))?;
        Ok(Self::new(group, element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("SeriesDescription".parse::<Tag>().unwrap(), Tag::SERIES_DESCRIPTION);
        assert_eq!("seriesdescription".parse::<Tag>().unwrap(), Tag::SERIES_DESCRIPTION);
        assert_eq!("0008,103E".parse::<Tag>().unwrap(), Tag::SERIES_DESCRIPTION);
        assert_eq!("(0008,103e)".parse::<Tag>().unwrap(), Tag::SERIES_DESCRIPTION);
        assert_eq!("0018 ,1030".parse::<Tag>().unwrap(), Tag::PROTOCOL_NAME);
        assert_eq!("0020000E".parse::<Tag>().unwrap(), Tag::SERIES_INSTANCE_UID);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("Nope".parse::<Tag>().is_err());
        assert!("008,103E".parse::<Tag>().is_err());
        assert!("zzzz,0000".parse::<Tag>().is_err());
    }

    #[test]
    fn test_display_and_keyword() {
        assert_eq!(Tag::SERIES_DESCRIPTION.to_string(), "(0008,103E)");
        assert_eq!(Tag::SERIES_DESCRIPTION.keyword(), Some("SeriesDescription"));
        assert_eq!(Tag::new(0x0009, 0x1001).keyword(), None);
    }

    #[test]
    fn test_ordering_follows_dataset_order() {
        assert!(Tag::MODALITY < Tag::SERIES_DESCRIPTION);
        assert!(Tag::SERIES_DESCRIPTION < Tag::PATIENT_NAME);
        assert!(Tag::new(0x0008, 0xFFFF) < Tag::new(0x0009, 0x0000));
    }
}
