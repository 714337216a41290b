use std::path::{Component, Path};
use walkdir::WalkDir;

use super::{ScanConfig, ScanError};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::exclude::ExclusionMatcher;
use crate::permissions::{self, PermissionRecord};

/// Walk `root` and collect a record for every non-directory entry that is not
/// excluded by `matcher`.
///
/// Records come back in traversal order. Entries within a directory are
/// visited sorted by file name, so two scans of the same tree agree.
pub fn scan(
    root: &Path,
    matcher: &ExclusionMatcher,
    config: &ScanConfig,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<PermissionRecord>, ScanError> {
    check_root(root)?;

    let walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name();

    // filter_entry prunes excluded directories so nothing beneath them is
    // listed, and drops excluded files before any metadata is read. Entries
    // without a UTF-8 relative path are dropped the same way.
    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            sink.report(Diagnostic::NonUtf8Path {
                path: entry.path().to_path_buf(),
            });
            return false;
        };
        let is_dir = entry.file_type().is_dir();
        if matcher.matches_entry(&relative, is_dir) {
            sink.report(Diagnostic::Excluded {
                relative_path: relative,
                is_dir,
            });
            return false;
        }
        true
    });

    let mut records = Vec::new();
    for entry_result in iter {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("unreadable source directory"));
                    return Err(ScanError::Unreadable {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                let path = e.path().map(Path::to_path_buf);
                let error = match e.io_error() {
                    Some(io_err) => io_err.to_string(),
                    None => e.to_string(),
                };
                sink.report(Diagnostic::Traversal { path, error });
                continue;
            }
        };

        if entry.depth() == 0 || entry.file_type().is_dir() {
            continue;
        }

        match permissions::read_metadata(entry.path()) {
            // Symlink to a directory that we are not following.
            Ok(metadata) if metadata.is_dir() => continue,
            Ok(metadata) => {
                if let Some(relative) = relative_path(root, entry.path()) {
                    records.push(PermissionRecord::from_metadata(relative, &metadata));
                }
            }
            Err(err) => sink.report(Diagnostic::Unreadable {
                path: err.path,
                error: err.source.to_string(),
            }),
        }
    }

    Ok(records)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root).map_err(|source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// `path` relative to `root`, joined with `/` on every platform. `None` if
/// any component is not valid UTF-8.
pub(crate) fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(part.to_str()?);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = PathBuf::from("/data/root");
        let path = root.join("sub").join("deep").join("f.txt");
        assert_eq!(relative_path(&root, &path).as_deref(), Some("sub/deep/f.txt"));
    }

    #[test]
    fn relative_path_of_direct_child() {
        let root = PathBuf::from("rel");
        assert_eq!(
            relative_path(&root, &root.join("a.txt")).as_deref(),
            Some("a.txt")
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn relative_path_rejects_non_utf8_component() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = PathBuf::from("/data/root");
        let path = root.join(OsStr::from_bytes(b"bad\xff")).join("f.txt");
        assert_eq!(relative_path(&root, &path), None);
    }
}
