//! Integration tests for dicomcopy-dicom.

use std::fs;
use std::path::Path;

use dicomcopy_dicom::{
    DicomReader, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN, MetadataReader, ParseError,
    Tag,
};
use tempfile::TempDir;

fn element(tag: Tag, vr: &[u8; 2], value: &str) -> Vec<u8> {
    let mut value = value.as_bytes().to_vec();
    if value.len() % 2 == 1 {
        value.push(if vr == b"UI" { 0 } else { b' ' });
    }
    let mut out = Vec::new();
    out.extend_from_slice(&tag.group.to_le_bytes());
    out.extend_from_slice(&tag.element.to_le_bytes());
    out.extend_from_slice(vr);
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(&value);
    out
}

fn implicit(tag: Tag, value: &str) -> Vec<u8> {
    let mut value = value.as_bytes().to_vec();
    if value.len() % 2 == 1 {
        value.push(b' ');
    }
    let mut out = Vec::new();
    out.extend_from_slice(&tag.group.to_le_bytes());
    out.extend_from_slice(&tag.element.to_le_bytes());
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(&value);
    out
}

fn write_part10(path: &Path, transfer_syntax: &str, dataset: &[u8]) {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend(element(Tag::TRANSFER_SYNTAX_UID, b"UI", transfer_syntax));
    bytes.extend_from_slice(dataset);
    fs::write(path, bytes).unwrap();
}

fn mr_image(description: &str) -> Vec<u8> {
    let mut dataset = element(Tag::MODALITY, b"CS", "MR");
    dataset.extend(element(Tag::SERIES_DESCRIPTION, b"LO", description));
    dataset.extend(element(Tag::PATIENT_ID, b"LO", "P0001"));
    dataset.extend(element(Tag::PROTOCOL_NAME, b"LO", "BRAIN"));
    // pixel data stand-in; must never be read
    dataset.extend_from_slice(&0x7FE0u16.to_le_bytes());
    dataset.extend_from_slice(&0x0010u16.to_le_bytes());
    dataset.extend_from_slice(b"OW\0\0");
    dataset.extend_from_slice(&1024u32.to_le_bytes());
    dataset.extend(std::iter::repeat_n(0u8, 1024));
    dataset
}

#[test]
fn test_series_description_from_study_files() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("i1.MRDC.1");
    let b = temp.path().join("i2.MRDC.2");
    write_part10(&a, EXPLICIT_VR_LITTLE_ENDIAN, &mr_image("t1sag_protocol"));
    write_part10(&b, EXPLICIT_VR_LITTLE_ENDIAN, &mr_image("other_protocol"));

    let reader = DicomReader::new();
    assert_eq!(
        reader.read_field(&a, Tag::SERIES_DESCRIPTION).unwrap(),
        "t1sag_protocol"
    );
    assert_eq!(
        reader.read_field(&b, Tag::SERIES_DESCRIPTION).unwrap(),
        "other_protocol"
    );
    assert_eq!(reader.read_field(&a, Tag::PROTOCOL_NAME).unwrap(), "BRAIN");
}

#[test]
fn test_field_selected_by_keyword() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("i3.MRDC.3");
    let mut dataset = implicit(Tag::MODALITY, "MR");
    dataset.extend(implicit(Tag::SERIES_DESCRIPTION, "t2flairsag"));
    write_part10(&path, IMPLICIT_VR_LITTLE_ENDIAN, &dataset);

    let tag: Tag = "Modality".parse().unwrap();
    assert_eq!(DicomReader::new().read_field(&path, tag).unwrap(), "MR");
}

#[test]
fn test_missing_attribute_is_absent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("i4.MRDC.4");
    write_part10(
        &path,
        EXPLICIT_VR_LITTLE_ENDIAN,
        &element(Tag::MODALITY, b"CS", "MR"),
    );

    let err = DicomReader::new()
        .read_field(&path, Tag::SERIES_DESCRIPTION)
        .unwrap_err();
    assert!(err.is_absent());
}

#[test]
fn test_corrupt_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("i5.MRDC.5");
    fs::write(&path, b"this is definitely not an image").unwrap();

    let err = DicomReader::new()
        .read_field(&path, Tag::SERIES_DESCRIPTION)
        .unwrap_err();
    assert!(matches!(err, ParseError::NotDicom(_)));
}
