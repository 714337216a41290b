//! Permission extraction for a single filesystem entry.

use serde::Serialize;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// File-type mask and type values of `st_mode`.
const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

/// The metadata call for an entry failed.
#[derive(Debug, thiserror::Error)]
#[error("cannot read metadata for {}", path.display())]
pub struct ReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Read/write/execute flags for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Access {
    /// Decode from a three-bit `rwx` triple (already shifted down).
    fn from_bits(bits: u32) -> Self {
        Self {
            read: bits & 0o4 != 0,
            write: bits & 0o2 != 0,
            execute: bits & 0o1 != 0,
        }
    }

    fn to_bits(self) -> u32 {
        (u32::from(self.read) << 2) | (u32::from(self.write) << 1) | u32::from(self.execute)
    }

    fn push_symbolic(self, out: &mut String) {
        out.push(if self.read { 'r' } else { '-' });
        out.push(if self.write { 'w' } else { '-' });
        out.push(if self.execute { 'x' } else { '-' });
    }
}

/// The nine standard permission bits as user/group/other × read/write/execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PermissionMatrix {
    pub user: Access,
    pub group: Access,
    pub other: Access,
}

impl PermissionMatrix {
    /// Decode the lower nine bits of `mode`; type and special bits are ignored.
    pub fn from_mode(mode: u32) -> Self {
        Self {
            user: Access::from_bits((mode >> 6) & 0o7),
            group: Access::from_bits((mode >> 3) & 0o7),
            other: Access::from_bits(mode & 0o7),
        }
    }

    /// Re-encode as permission bits (`0o000..=0o777`).
    pub fn to_mode_bits(&self) -> u32 {
        (self.user.to_bits() << 6) | (self.group.to_bits() << 3) | self.other.to_bits()
    }

    /// All nine flags in owner/group/other, read/write/execute order.
    pub fn flags(&self) -> [bool; 9] {
        let Self { user, group, other } = *self;
        [
            user.read,
            user.write,
            user.execute,
            group.read,
            group.write,
            group.execute,
            other.read,
            other.write,
            other.execute,
        ]
    }
}

/// Observed permission state of one scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
    pub owner_uid: u32,
    pub group_gid: u32,
    /// Ten-character symbolic mode, e.g. `-rw-r--r--`.
    pub mode_string: String,
    pub size_bytes: u64,
    pub permission_matrix: PermissionMatrix,
}

impl PermissionRecord {
    /// Build a record from already-fetched metadata.
    pub fn from_metadata(relative_path: impl Into<String>, metadata: &Metadata) -> Self {
        let mode = raw_mode(metadata);
        Self {
            relative_path: relative_path.into(),
            owner_uid: owner_uid(metadata),
            group_gid: group_gid(metadata),
            mode_string: mode_string(mode),
            size_bytes: metadata.len(),
            permission_matrix: PermissionMatrix::from_mode(mode),
        }
    }
}

// Shape exposed to templates: `file_path` plus a nested `permissions` object.
#[derive(Serialize)]
struct RecordView<'a> {
    file_path: &'a str,
    permissions: PermissionsView<'a>,
}

#[derive(Serialize)]
struct PermissionsView<'a> {
    user: &'a Access,
    group: &'a Access,
    other: &'a Access,
    owner: u32,
    group_id: u32,
    mode: &'a str,
    file_size: u64,
}

impl Serialize for PermissionRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordView {
            file_path: &self.relative_path,
            permissions: PermissionsView {
                user: &self.permission_matrix.user,
                group: &self.permission_matrix.group,
                other: &self.permission_matrix.other,
                owner: self.owner_uid,
                group_id: self.group_gid,
                mode: &self.mode_string,
                file_size: self.size_bytes,
            },
        }
        .serialize(serializer)
    }
}

/// Fetch metadata for `path`, following symlinks.
pub fn read_metadata(path: &Path) -> Result<Metadata, ReadError> {
    std::fs::metadata(path).map_err(|source| ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the permission record for the file at `path`.
pub fn read(path: &Path, relative_path: &str) -> Result<PermissionRecord, ReadError> {
    let metadata = read_metadata(path)?;
    Ok(PermissionRecord::from_metadata(relative_path, &metadata))
}

/// Symbolic `ls -l` style rendering of a full `st_mode` value.
pub fn mode_string(mode: u32) -> String {
    let mut out = String::with_capacity(10);
    out.push(file_type_char(mode));
    let matrix = PermissionMatrix::from_mode(mode);
    matrix.user.push_symbolic(&mut out);
    matrix.group.push_symbolic(&mut out);
    matrix.other.push_symbolic(&mut out);
    out
}

fn file_type_char(mode: u32) -> char {
    match mode & S_IFMT {
        S_IFREG => '-',
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        S_IFIFO => 'p',
        S_IFSOCK => 's',
        S_IFCHR => 'c',
        S_IFBLK => 'b',
        _ => '-',
    }
}

#[cfg(unix)]
fn raw_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn raw_mode(metadata: &Metadata) -> u32 {
    let kind = if metadata.is_dir() { S_IFDIR } else { S_IFREG };
    let perms = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    kind | perms
}

#[cfg(unix)]
fn owner_uid(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.uid()
}

#[cfg(not(unix))]
fn owner_uid(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn group_gid(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.gid()
}

#[cfg(not(unix))]
fn group_gid(_metadata: &Metadata) -> u32 {
    0
}
