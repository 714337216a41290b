//! Gitignore-style exclusion matching against scan-relative paths.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::borrow::Cow;
use std::path::Path;

/// Patterns are always evaluated against relative paths, so the builder root
/// is only used to strip a leading `./`.
const MATCH_ROOT: &str = ".";

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid exclusion pattern {pattern:?}")]
    Invalid {
        pattern: String,
        #[source]
        source: ignore::Error,
    },
    #[error("failed to build exclusion matcher")]
    Build(#[source] ignore::Error),
}

/// Compiled exclusion list.
///
/// Semantics follow `.gitignore`: the last matching pattern wins, `!`
/// re-includes, a leading `/` anchors to the scan root, a trailing `/` only
/// matches directories, and anything below an excluded directory is excluded.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    gitignore: Gitignore,
}

impl ExclusionMatcher {
    /// Compile an ordered pattern list. Blank lines and `#` comments are ignored.
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(MATCH_ROOT);
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|source| PatternError::Invalid {
                    pattern: pattern.to_string(),
                    source,
                })?;
        }
        let gitignore = builder.build().map_err(PatternError::Build)?;
        Ok(Self { gitignore })
    }

    /// A matcher that excludes nothing.
    pub fn empty() -> Self {
        Self {
            gitignore: Gitignore::empty(),
        }
    }

    /// True when no effective patterns were compiled.
    pub fn is_empty(&self) -> bool {
        self.gitignore.is_empty()
    }

    /// Whether a file at `relative_path` is excluded.
    pub fn matches(&self, relative_path: &str) -> bool {
        self.is_excluded(relative_path, false)
    }

    /// Whether a directory at `relative_path` is excluded.
    pub fn matches_dir(&self, relative_path: &str) -> bool {
        self.is_excluded(relative_path, true)
    }

    fn is_excluded(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.is_empty() {
            return false;
        }
        let path = normalize(relative_path);
        if path.is_empty() {
            return false;
        }
        // A parent directory that is excluded hides everything beneath it,
        // regardless of later negations.
        for (idx, _) in path.match_indices('/') {
            if self.matches_entry(&path[..idx], true) {
                return true;
            }
        }
        self.matches_entry(&path, is_dir)
    }

    /// Match one entry without consulting its ancestors. The scanner uses this
    /// once the ancestors are already known to be kept.
    pub(crate) fn matches_entry(&self, relative_path: &str, is_dir: bool) -> bool {
        self.gitignore
            .matched(Path::new(relative_path), is_dir)
            .is_ignore()
    }
}

impl Default for ExclusionMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

fn normalize(relative_path: &str) -> Cow<'_, str> {
    let path: Cow<'_, str> = if cfg!(windows) && relative_path.contains('\\') {
        Cow::Owned(relative_path.replace('\\', "/"))
    } else {
        Cow::Borrowed(relative_path)
    };
    let trimmed = path
        .trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('/');
    if trimmed.len() == path.len() {
        path
    } else {
        Cow::Owned(trimmed.to_string())
    }
}
