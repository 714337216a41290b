//! Scan → render → write, run strictly in sequence.

use crate::diagnostics::DiagnosticSink;
use crate::exclude::{ExclusionMatcher, PatternError};
use crate::output::{self, Format, WriteError};
use crate::scan::{DirectoryScanner, ScanConfig, ScanError, WalkdirScanner};
use crate::template::{MiniJinjaEngine, TemplateEngine, TemplateError, TemplateSource};
use std::path::PathBuf;

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub output_file: PathBuf,
    pub template_file: PathBuf,
    pub exclude_patterns: Vec<String>,
    pub format: Format,
    pub follow_symlinks: bool,
    pub strict_undefined: bool,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub output_file: PathBuf,
}

/// Any failure that aborts a run. None of them leave an output file behind.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{}: Source directory does not exist", path.display())]
    MissingSourceDir { path: PathBuf },
    #[error("{}: Template file does not exist", path.display())]
    MissingTemplate { path: PathBuf },
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Run with the walkdir scanner and the minijinja engine.
pub fn run(config: &RunConfig, sink: &dyn DiagnosticSink) -> Result<RunSummary, PipelineError> {
    let engine = MiniJinjaEngine::new(config.strict_undefined);
    run_with(config, &WalkdirScanner, &engine, sink)
}

/// Run with explicit collaborators.
pub fn run_with(
    config: &RunConfig,
    scanner: &dyn DirectoryScanner,
    engine: &dyn TemplateEngine,
    sink: &dyn DiagnosticSink,
) -> Result<RunSummary, PipelineError> {
    if !config.source_dir.is_dir() {
        return Err(PipelineError::MissingSourceDir {
            path: config.source_dir.clone(),
        });
    }
    if !config.template_file.is_file() {
        return Err(PipelineError::MissingTemplate {
            path: config.template_file.clone(),
        });
    }
    // Fail before scanning when the build cannot produce the format at all.
    if !config.format.is_supported() {
        return Err(WriteError::UnsupportedFormat {
            format: config.format,
        }
        .into());
    }

    let matcher = ExclusionMatcher::compile(&config.exclude_patterns)?;
    let template = TemplateSource::load(&config.template_file)?;

    tracing::info!("scanning {}", config.source_dir.display());
    let scan_config = ScanConfig {
        follow_symlinks: config.follow_symlinks,
    };
    let records = scanner.scan(&config.source_dir, &matcher, &scan_config, sink)?;
    if records.is_empty() {
        tracing::warn!(
            "No permissions data collected. Check source directory and exclude patterns."
        );
    } else {
        tracing::info!("collected {} file records", records.len());
    }

    let rendered = engine.render(&template, &records)?;
    output::write(&config.output_file, &rendered, config.format)?;
    tracing::info!("Successfully wrote output to {}", config.output_file.display());

    Ok(RunSummary {
        records: records.len(),
        output_file: config.output_file.clone(),
    })
}
