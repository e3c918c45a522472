//! Run configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::classify::{Filters, PathClassifier};
use crate::error::ConfigError;
use crate::pattern::{PatternSet, PatternSyntax};

/// Default file name pattern for GE MR image files (`i123.MRDC.4`).
pub const DEFAULT_FILE_NAME_PATTERN: &str = r"i\d+\.MRDC\.\d+";

/// Default series description patterns: sagittal T1 and T2 FLAIR.
pub const DEFAULT_SERIES_PATTERNS: &[&str] = &["t1sag.*", "t2flairsag.*"];

/// [`DEFAULT_FILE_NAME_PATTERN`] for glob syntax.
pub const DEFAULT_GLOB_FILE_NAME_PATTERN: &str = "i*.MRDC.*";

/// [`DEFAULT_SERIES_PATTERNS`] for glob syntax.
pub const DEFAULT_GLOB_SERIES_PATTERNS: &[&str] = &["t1sag*", "t2flairsag*"];

/// Default metadata attribute inspected in candidate files.
pub const DEFAULT_FIELD: &str = "SeriesDescription";

/// Configuration for one filtered copy run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CopyConfig {
    /// Root of the tree to copy from.
    pub source_root: PathBuf,

    /// Root of the mirrored tree.
    pub target_root: PathBuf,

    /// Pattern that marks a directory as the source root by name.
    ///
    /// When unset, the literal file name of `source_root` is used.
    #[builder(default)]
    #[serde(default)]
    pub root_name_pattern: Option<String>,

    /// Directory name patterns that are always copied and descended into.
    #[builder(default)]
    #[serde(default)]
    pub intermediate_patterns: Vec<String>,

    /// Directory name pattern for directories holding image files.
    pub leaf_container_pattern: String,

    /// Patterns matched against the extracted field value.
    ///
    /// Empty means the default sagittal series, written in `pattern_syntax`.
    #[builder(default)]
    #[serde(default)]
    pub series_patterns: Vec<String>,

    /// Pattern for candidate image file names.
    ///
    /// `None` means the GE image name default, written in `pattern_syntax`.
    #[builder(default)]
    #[serde(default)]
    pub file_name_pattern: Option<String>,

    /// How pattern strings are interpreted.
    #[builder(default)]
    #[serde(default)]
    pub pattern_syntax: PatternSyntax,

    /// Attribute keyword or `gggg,eeee` tag to read from candidate files.
    #[builder(default = "DEFAULT_FIELD.to_string()")]
    #[serde(default = "default_field")]
    pub field: String,

    /// Decide and report without writing anything.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,
}

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

impl CopyConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source_root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Source root cannot be empty".to_string());
            }
            None => return Err("Source root is required".to_string()),
            _ => {}
        }
        match self.target_root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Target root cannot be empty".to_string());
            }
            None => return Err("Target root is required".to_string()),
            _ => {}
        }
        match self.leaf_container_pattern {
            Some(ref pattern) if pattern.is_empty() => {
                return Err("Leaf container pattern cannot be empty".to_string());
            }
            None => return Err("Leaf container pattern is required".to_string()),
            _ => {}
        }
        if let Some(ref series) = self.series_patterns {
            if series.iter().any(String::is_empty) {
                return Err("Series patterns cannot be empty".to_string());
            }
        }
        if let Some(Some(ref file_name)) = self.file_name_pattern {
            if file_name.is_empty() {
                return Err("File name pattern cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Apply every value present in a config file.
    ///
    /// Call before command line overrides so that flags win.
    pub fn merge_file(&mut self, file: &FilterFile) -> &mut Self {
        if let Some(ref root_name) = file.root_name {
            self.root_name_pattern(Some(root_name.clone()));
        }
        if !file.intermediate.is_empty() {
            self.intermediate_patterns(file.intermediate.clone());
        }
        if let Some(ref leaf) = file.leaf {
            self.leaf_container_pattern(leaf.clone());
        }
        if !file.series.is_empty() {
            self.series_patterns(file.series.clone());
        }
        if let Some(ref file_name) = file.file_name {
            self.file_name_pattern(file_name.clone());
        }
        if let Some(syntax) = file.syntax {
            self.pattern_syntax(syntax);
        }
        if let Some(ref field) = file.field {
            self.field(field.clone());
        }
        self
    }
}

impl CopyConfig {
    /// Create a new config builder.
    pub fn builder() -> CopyConfigBuilder {
        CopyConfigBuilder::default()
    }

    /// Create a config with default series and file patterns.
    pub fn new(
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        leaf_container_pattern: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            root_name_pattern: None,
            intermediate_patterns: Vec::new(),
            leaf_container_pattern: leaf_container_pattern.into(),
            series_patterns: Vec::new(),
            file_name_pattern: None,
            pattern_syntax: PatternSyntax::default(),
            field: default_field(),
            dry_run: false,
        }
    }

    /// Compile all patterns.
    ///
    /// `source_name` is the file name of the resolved source root and is
    /// matched literally when no root name pattern is configured.
    pub fn compile(&self, source_name: &str) -> Result<Filters, ConfigError> {
        let syntax = self.pattern_syntax;
        let root_name = match self.root_name_pattern {
            Some(ref pattern) => PatternSet::compile(&[pattern], syntax)?,
            None => PatternSet::literal(&[source_name]),
        };
        let classifier = PathClassifier::new(
            root_name,
            PatternSet::compile(self.intermediate_patterns.as_slice(), syntax)?,
            PatternSet::compile(&[&self.leaf_container_pattern], syntax)?,
        );

        let file_name = match self.file_name_pattern {
            Some(ref pattern) => PatternSet::compile(&[pattern], syntax)?,
            None => PatternSet::compile(&[default_patterns(syntax)?.0], syntax)?,
        };
        let series = if self.series_patterns.is_empty() {
            PatternSet::compile(default_patterns(syntax)?.1, syntax)?
        } else {
            PatternSet::compile(self.series_patterns.as_slice(), syntax)?
        };

        Ok(Filters {
            classifier,
            file_name,
            series,
        })
    }
}

/// Default file name and series patterns written in `syntax`.
fn default_patterns(
    syntax: PatternSyntax,
) -> Result<(&'static str, &'static [&'static str]), ConfigError> {
    match syntax {
        PatternSyntax::Regex => Ok((DEFAULT_FILE_NAME_PATTERN, DEFAULT_SERIES_PATTERNS)),
        PatternSyntax::Glob => Ok((
            DEFAULT_GLOB_FILE_NAME_PATTERN,
            DEFAULT_GLOB_SERIES_PATTERNS,
        )),
        PatternSyntax::Literal => Err(ConfigError::invalid(
            "literal syntax requires explicit file name and series patterns",
        )),
    }
}

/// Re-anchor `source_path` from `source_root` onto `target_root`.
pub fn mirror_path(
    source_root: &Path,
    target_root: &Path,
    source_path: &Path,
) -> Option<PathBuf> {
    let relative = source_path.strip_prefix(source_root).ok()?;
    if relative.as_os_str().is_empty() {
        Some(target_root.to_path_buf())
    } else {
        Some(target_root.join(relative))
    }
}

/// Pattern settings loaded from a TOML file.
///
/// Every key is optional; roots always come from the command line.
///
/// ```toml
/// leaf = 's\d+'
/// intermediate = ['e\d+', 'DICOM']
/// series = ['t1sag.*', 't2flairsag.*']
/// file_name = 'i\d+\.MRDC\.\d+'
/// syntax = "regex"
/// field = "SeriesDescription"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterFile {
    pub root_name: Option<String>,
    pub intermediate: Vec<String>,
    pub leaf: Option<String>,
    pub series: Vec<String>,
    pub file_name: Option<String>,
    pub syntax: Option<PatternSyntax>,
    pub field: Option<String>,
}

impl FilterFile {
    /// Load and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }
}
