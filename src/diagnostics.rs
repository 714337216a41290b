//! Non-fatal diagnostics emitted while scanning.
//!
//! The scanner never logs directly; it reports to a caller-supplied
//! [`DiagnosticSink`]. The binary uses [`TracingSink`], tests use
//! [`CollectingSink`] to assert on what was skipped.

use std::cell::RefCell;
use std::path::PathBuf;

/// A single per-entry event that did not abort the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The entry matched an exclusion pattern and was skipped before any metadata read.
    Excluded { relative_path: String, is_dir: bool },
    /// Metadata for the entry could not be read; it is absent from the records.
    Unreadable { path: PathBuf, error: String },
    /// The walker could not descend into or list an entry below the root.
    Traversal { path: Option<PathBuf>, error: String },
    /// The entry's path below the root is not valid UTF-8 and cannot be
    /// named in a record. Directories are skipped with everything beneath them.
    NonUtf8Path { path: PathBuf },
}

/// Receiver for scan diagnostics.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Excluded {
                relative_path,
                is_dir,
            } => {
                if is_dir {
                    tracing::debug!("excluding directory: {relative_path}/");
                } else {
                    tracing::debug!("excluding file: {relative_path}");
                }
            }
            Diagnostic::Unreadable { path, error } => {
                tracing::error!("error getting permissions for {}: {error}", path.display());
            }
            Diagnostic::Traversal { path, error } => match path {
                Some(p) => tracing::warn!("skipping {}: {error}", p.display()),
                None => tracing::warn!("traversal error: {error}"),
            },
            Diagnostic::NonUtf8Path { path } => {
                tracing::warn!("skipping {}: path is not valid UTF-8", path.display());
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of `Unreadable` diagnostics reported so far.
    pub fn unreadable_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|d| matches!(d, Diagnostic::Unreadable { .. }))
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_counts_unreadable_only() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::Excluded {
            relative_path: "a.log".into(),
            is_dir: false,
        });
        sink.report(Diagnostic::Unreadable {
            path: PathBuf::from("/tmp/x"),
            error: "gone".into(),
        });
        assert_eq!(sink.unreadable_count(), 1);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.take().is_empty());
    }
}
