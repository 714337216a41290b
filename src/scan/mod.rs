//! Directory traversal that turns a tree into permission records.

pub(crate) mod walk;

use crate::diagnostics::DiagnosticSink;
use crate::exclude::ExclusionMatcher;
use crate::permissions::PermissionRecord;
use std::path::{Path, PathBuf};

pub use walk::scan;

/// The scan root could not be used. Nothing is returned in this case.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{}: cannot open source directory", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: Not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

/// Configuration for a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Descend into symlinked directories instead of skipping them.
    pub follow_symlinks: bool,
}

/// Abstraction over directory scanning so it can be swapped or mocked.
pub trait DirectoryScanner {
    fn scan(
        &self,
        root: &Path,
        matcher: &ExclusionMatcher,
        config: &ScanConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<PermissionRecord>, ScanError>;
}

/// Default `DirectoryScanner` that delegates to the walkdir-based implementation.
pub struct WalkdirScanner;

impl DirectoryScanner for WalkdirScanner {
    fn scan(
        &self,
        root: &Path,
        matcher: &ExclusionMatcher,
        config: &ScanConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<PermissionRecord>, ScanError> {
        scan(root, matcher, config, sink)
    }
}
