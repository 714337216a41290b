#![allow(dead_code)]

use permtemplate::{Format, RunConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a directory structure from a list of relative paths.
/// Paths ending with '/' create directories; others create small files.
pub fn create_fixture(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for p in paths {
        let full = tmp.path().join(p);
        if p.ends_with('/') {
            fs::create_dir_all(&full).unwrap();
        } else {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, p.as_bytes()).unwrap();
        }
    }
    tmp
}

/// Create files with explicit permission bits.
#[cfg(unix)]
pub fn create_fixture_with_modes(files: &[(&str, u32)]) -> TempDir {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    for (p, mode) in files {
        let full = tmp.path().join(p);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, p.as_bytes()).unwrap();
        fs::set_permissions(&full, fs::Permissions::from_mode(*mode)).unwrap();
    }
    tmp
}

/// Write a template file into `dir` and return its path.
pub fn write_template(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).unwrap();
    path
}

/// A strict-mode run configuration with no exclusions.
pub fn run_config(source: &Path, template: &Path, output: &Path, format: Format) -> RunConfig {
    RunConfig {
        source_dir: source.to_path_buf(),
        output_file: output.to_path_buf(),
        template_file: template.to_path_buf(),
        exclude_patterns: Vec::new(),
        format,
        follow_symlinks: false,
        strict_undefined: true,
    }
}

/// Relative paths of a record list, in order.
pub fn paths(records: &[permtemplate::PermissionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.relative_path.as_str()).collect()
}

/// Template that lists every record as a JSON array.
pub const JSON_LIST_TEMPLATE: &str = r#"[
{%- for f in files %}
  {"path": "{{ f.file_path }}", "mode": "{{ f.permissions.mode }}", "owner": {{ f.permissions.owner }}, "size": {{ f.permissions.file_size }}, "user_x": {{ f.permissions.user.execute | tojson }}}{% if not loop.last %},{% endif %}
{%- endfor %}
]"#;
