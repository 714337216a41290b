#![forbid(unsafe_code)]
//! permtemplate: scan a directory tree's permission bits and ownership, filter
//! with gitignore-style patterns, and render the records through a template
//! into canonical JSON or YAML.

pub mod cli;
pub mod diagnostics;
pub mod exclude;
pub mod output;
pub mod permissions;
pub mod pipeline;
pub mod scan;
pub mod template;

pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use exclude::ExclusionMatcher;
pub use output::Format;
pub use permissions::{PermissionMatrix, PermissionRecord};
pub use pipeline::{run, RunConfig, RunSummary};
