use dicomcopy_core::{
    ConfigError, CopyConfig, DirClass, FilterFile, PatternSyntax, WalkError, mirror_path,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_filter_file_load_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("filters.toml");
    fs::write(
        &path,
        r#"
root_name = 'raw_.*'
intermediate = ['e\d+', 'DICOM']
leaf = 's\d+'
series = ['t1sag.*']
file_name = 'i\d+\.MRDC\.\d+'
field = "0008,103E"
"#,
    )
    .unwrap();

    let file = FilterFile::load(&path).unwrap();
    assert_eq!(file.root_name.as_deref(), Some("raw_.*"));
    assert_eq!(file.intermediate.len(), 2);
    assert_eq!(file.field.as_deref(), Some("0008,103E"));
    assert!(file.syntax.is_none());
}

#[test]
fn test_filter_file_missing() {
    let temp = TempDir::new().unwrap();
    let err = FilterFile::load(temp.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_filter_file_parse_error_carries_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    fs::write(&path, "leaf = [").unwrap();

    match FilterFile::load(&path).unwrap_err() {
        ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_compiled_filters_classify_study_layout() {
    let config = CopyConfig::builder()
        .source_root("/data/raw")
        .target_root("/data/filtered")
        .intermediate_patterns(vec![r"e\d+".to_string()])
        .leaf_container_pattern(r"s\d+")
        .build()
        .unwrap();
    let filters = config.compile("raw").unwrap();

    assert_eq!(filters.classifier.classify("raw"), DirClass::Intermediate);
    assert_eq!(filters.classifier.classify("e5521"), DirClass::Intermediate);
    assert_eq!(filters.classifier.classify("s3"), DirClass::LeafContainer);
    assert_eq!(filters.classifier.classify("reports"), DirClass::Other);

    assert!(filters.file_name.is_match("i1.MRDC.1"));
    assert!(filters.file_name.is_match("i1024.MRDC.17"));
    assert!(!filters.file_name.is_match("i1.MRDC.1.bak"));
    assert!(!filters.file_name.is_match("README"));

    assert!(filters.series.is_match("t1sag_protocol"));
    assert!(filters.series.is_match("t2flairsag"));
    assert!(!filters.series.is_match("other_protocol"));
}

#[test]
fn test_root_name_pattern_overrides_literal() {
    let mut config = CopyConfig::new("/data/raw", "/out", r"s\d+");
    config.root_name_pattern = Some("raw|incoming".to_string());
    let filters = config.compile("raw").unwrap();

    assert!(filters.classifier.is_root_name("raw"));
    assert!(filters.classifier.is_root_name("incoming"));
    assert_eq!(filters.classifier.classify("incoming"), DirClass::Intermediate);
}

#[test]
fn test_glob_syntax_applies_to_every_slot() {
    let mut config = CopyConfig::new("/data/raw", "/out", "s*");
    config.pattern_syntax = PatternSyntax::Glob;
    config.intermediate_patterns = vec!["e*".to_string()];
    config.series_patterns = vec!["t1sag*".to_string()];
    config.file_name_pattern = Some("i*.MRDC.*".to_string());
    let filters = config.compile("raw").unwrap();

    assert_eq!(filters.classifier.classify("e1"), DirClass::Intermediate);
    assert_eq!(filters.classifier.classify("s1"), DirClass::LeafContainer);
    assert!(filters.file_name.is_match("i5.MRDC.2"));
    assert!(filters.series.is_match("t1sag_3d"));
}

#[test]
fn test_mirror_path_preserves_relative_position() {
    let source = Path::new("/src/study");
    let target = Path::new("/dst/study");
    let node = Path::new("/src/study/e1/s2/i3.MRDC.4");

    let mirrored = mirror_path(source, target, node).unwrap();
    assert_eq!(mirrored, PathBuf::from("/dst/study/e1/s2/i3.MRDC.4"));
    assert_eq!(
        mirrored.strip_prefix(target).unwrap(),
        node.strip_prefix(source).unwrap()
    );
}

#[test]
fn test_config_serde_round_trip_keeps_defaults() {
    let json = r#"{
        "source_root": "/a",
        "target_root": "/b",
        "leaf_container_pattern": "s1"
    }"#;
    let config: CopyConfig = serde_json::from_str(json).unwrap();
    assert!(config.series_patterns.is_empty());
    assert_eq!(config.file_name_pattern, None);
    let filters = config.compile("a").unwrap();
    assert!(filters.series.is_match("t1sag_protocol"));
    assert_eq!(config.pattern_syntax, PatternSyntax::Regex);
    assert!(!config.dry_run);
}

#[test]
fn test_walk_error_display() {
    let err = WalkError::NotADirectory {
        path: PathBuf::from("/data/file.txt"),
    };
    assert_eq!(err.to_string(), "Source root is not a directory: /data/file.txt");
}
