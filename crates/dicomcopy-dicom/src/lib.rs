//! Minimal DICOM attribute reader for dicomcopy.
//!
//! This crate reads single textual attributes (such as SeriesDescription)
//! from DICOM Part 10 files and raw datasets without decoding pixel data.
//! Text values honour the dataset's Specific Character Set.

mod charset;
mod error;
mod reader;
mod tag;

pub use error::ParseError;
pub use reader::{
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, DicomReader, EXPLICIT_VR_BIG_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN, Encoding, GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN,
    IMPLICIT_VR_LITTLE_ENDIAN, MetadataReader,
};
pub use tag::{Tag, TagParseError};
