//! dicomcopy - Selective replication of DICOM study trees.
//!
//! Usage:
//!   dicomcopy copy SOURCE TARGET --leaf PAT   Copy admitted series
//!   dicomcopy inspect FILE...                 Print a metadata field
//!   dicomcopy classify SOURCE --leaf PAT      Show per-directory verdicts
//!   dicomcopy --help                          Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};

use dicomcopy_core::{CopyConfig, CopyReport, DEFAULT_FIELD, FilterFile, PatternSyntax};
use dicomcopy_dicom::{DicomReader, MetadataReader, Tag};
use dicomcopy_ops::{DryRunCopier, FsCopier};
use dicomcopy_scan::{Decision, DirectoryVerdict, TreeWalkEngine, WarningKind};

#[derive(Parser)]
#[command(
    name = "dicomcopy",
    version,
    about = "Selective replication of DICOM study trees",
    long_about = "dicomcopy mirrors the parts of a study tree you care about.\n\n\
                  Directories are admitted by name; series directories are only \
                  copied when at least one image in them carries a wanted series \
                  description."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the admitted part of SOURCE to TARGET
    Copy {
        /// Root of the study tree
        source: PathBuf,

        /// Root of the filtered copy
        target: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Decide and report without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print a metadata field of each file
    Inspect {
        /// Files to read
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Attribute keyword or tag (e.g. SeriesDescription, 0008,103E)
        #[arg(long, default_value = DEFAULT_FIELD)]
        field: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the verdict for every directory without copying
    Classify {
        /// Root of the study tree
        source: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// TOML file with pattern settings; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pattern naming the source root directory (default: its literal name)
    #[arg(long)]
    root_name: Option<String>,

    /// Directory pattern that is always copied and entered (repeatable)
    #[arg(short, long = "intermediate")]
    intermediate: Vec<String>,

    /// Directory pattern for series directories holding images
    #[arg(short, long)]
    leaf: Option<String>,

    /// Wanted series description pattern (repeatable)
    #[arg(short, long = "series")]
    series: Vec<String>,

    /// Pattern for candidate image file names
    #[arg(long)]
    file_name: Option<String>,

    /// Interpret every pattern as a glob instead of a regular expression;
    /// the default file name and series patterns switch to their glob forms
    #[arg(long)]
    glob: bool,

    /// Attribute keyword or tag read from candidate files
    #[arg(long)]
    field: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Copy {
            source,
            target,
            filters,
            dry_run,
            format,
        } => {
            let config = build_config(source, target, filters, dry_run)?;
            run_copy(&config, format)?;
        }
        Command::Inspect {
            files,
            field,
            format,
        } => {
            run_inspect(&files, &field, format)?;
        }
        Command::Classify { source, filters } => {
            let target = preview_target(&source)?;
            let config = build_config(source, target, filters, true)?;
            run_classify(&config)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the config file and flags into a validated config.
fn build_config(
    source: PathBuf,
    target: PathBuf,
    filters: FilterArgs,
    dry_run: bool,
) -> Result<CopyConfig> {
    let mut builder = CopyConfig::builder();
    builder.source_root(source).target_root(target).dry_run(dry_run);

    if let Some(ref path) = filters.config {
        let file = FilterFile::load(path)?;
        builder.merge_file(&file);
    }
    if let Some(root_name) = filters.root_name {
        builder.root_name_pattern(Some(root_name));
    }
    if !filters.intermediate.is_empty() {
        builder.intermediate_patterns(filters.intermediate);
    }
    if let Some(leaf) = filters.leaf {
        builder.leaf_container_pattern(leaf);
    }
    if !filters.series.is_empty() {
        builder.series_patterns(filters.series);
    }
    if let Some(file_name) = filters.file_name {
        builder.file_name_pattern(file_name);
    }
    if filters.glob {
        builder.pattern_syntax(PatternSyntax::Glob);
    }
    if let Some(field) = filters.field {
        builder.field(field);
    }

    builder.build().context("Invalid configuration")
}

/// Target root used only for display by `classify`.
fn preview_target(source: &Path) -> Result<PathBuf> {
    let source = source.canonicalize().context("Invalid source path")?;
    let name = source
        .file_name()
        .ok_or_else(|| eyre!("Source root has no directory name: {}", source.display()))?;
    let mut preview = name.to_os_string();
    preview.push(".filtered");
    Ok(source.with_file_name(preview))
}

/// Run the filtered copy and print the report.
fn run_copy(config: &CopyConfig, format: OutputFormat) -> Result<()> {
    let report = if config.dry_run {
        TreeWalkEngine::new(config, DicomReader::new(), DryRunCopier::new())
            .context("Cannot start copy")?
            .run()
    } else {
        TreeWalkEngine::new(config, DicomReader::new(), FsCopier::new())
            .context("Cannot start copy")?
            .run()
    };

    match format {
        OutputFormat::Text => print_report(config, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_report(config: &CopyConfig, report: &CopyReport) {
    println!();
    println!("{}", "─".repeat(60));
    if config.dry_run {
        println!(" Dry run: nothing was written to {}", config.target_root.display());
    } else {
        println!(
            " {} -> {} ({})",
            config.source_root.display(),
            config.target_root.display(),
            format_size(report.bytes_copied)
        );
    }
    println!(
        " {} directories visited, {} admitted, {} pruned",
        report.dirs_visited, report.dirs_admitted, report.dirs_pruned
    );
    println!(
        " {} files seen, {} copied, {} skipped",
        report.files_seen, report.files_copied, report.files_skipped
    );
    if report.files_failed > 0 {
        println!(" {} files could not be copied", report.files_failed);
    }
    if report.metadata_failures > 0 {
        println!(" {} files with unreadable metadata", report.metadata_failures);
    }
    let unlisted = report.count_kind(WarningKind::ReadError);
    if unlisted > 0 {
        println!(" {unlisted} directories could not be listed");
    }
    println!(" Finished in {:.2}s", report.elapsed.as_secs_f64());
    println!("{}", "─".repeat(60));

    if !report.planned.is_empty() {
        println!();
        println!(" Would create:");
        for path in &report.planned {
            println!("   {}", path.display());
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{} warning(s) during copy", report.warnings.len());
        for warning in &report.warnings {
            println!("   [{}] {}", warning.kind, warning);
        }
    }
}

/// Print one attribute of each file.
fn run_inspect(files: &[PathBuf], field: &str, format: OutputFormat) -> Result<()> {
    let tag: Tag = field.parse()?;
    let reader = DicomReader::new();
    let name = tag.keyword().map(str::to_string).unwrap_or_else(|| tag.to_string());

    let mut rows = Vec::with_capacity(files.len());
    for path in files {
        let result = reader.read_field(path, tag);
        match format {
            OutputFormat::Text => match &result {
                Ok(value) => println!("{}: {name} = {value}", path.display()),
                Err(e) => println!("{}: error: {e}", path.display()),
            },
            OutputFormat::Json => rows.push(match result {
                Ok(value) => serde_json::json!({
                    "path": path,
                    "field": name,
                    "value": value,
                }),
                Err(e) => serde_json::json!({
                    "path": path,
                    "field": name,
                    "error": e.to_string(),
                }),
            }),
        }
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    Ok(())
}

/// Print the decision for every directory the walk reaches.
fn run_classify(config: &CopyConfig) -> Result<()> {
    let engine = TreeWalkEngine::new(config, DicomReader::new(), DryRunCopier::new())
        .context("Cannot start classification")?;
    let root = engine.source_root().to_path_buf();

    let report = engine.run_observed(|decision: &Decision| {
        let verdict = match decision.verdict {
            DirectoryVerdict::CopyAndDescend => "copy",
            DirectoryVerdict::SkipSubtree => "prune",
        };
        let relative = decision.path.strip_prefix(&root).unwrap_or(&decision.path);
        let shown = if relative.as_os_str().is_empty() {
            Path::new(".")
        } else {
            relative
        };
        println!("{verdict:<6} {:<13} {}", decision.class.to_string(), shown.display());
    });

    println!();
    println!(
        "{} directories: {} admitted, {} pruned; {} of {} files would be copied",
        report.dirs_visited,
        report.dirs_admitted,
        report.dirs_pruned,
        report.files_copied,
        report.files_seen
    );
    if report.metadata_failures > 0 {
        println!("{} files with unreadable metadata", report.metadata_failures);
    }

    Ok(())
}

/// Format a size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
