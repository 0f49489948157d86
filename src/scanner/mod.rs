//! Scanner module for file discovery and the candidate data model.
//!
//! The scanner is divided into submodules:
//! - [`walker`]: traversal of command-line roots into a stream of file entries
//! - [`alias`]: folding of hardlinks (and followed symlinks) into candidates
//!
//! A [`FileEntry`] is one discovered path with its metadata; a [`Candidate`]
//! is one logical file, possibly reachable through several alias paths, as
//! seen by the comparison engine.

pub mod alias;
pub mod walker;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use alias::{AliasFolder, FileId};
pub use walker::Walker;

/// Metadata for a discovered file.
///
/// The size and modification time are captured at scan time; nothing
/// downstream re-stats the file. `root_index` is the 1-based position of the
/// command-line argument this entry was discovered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path as presented on or discovered under the command line
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// 1-based index of the root argument that introduced this entry
    pub root_index: usize,
    /// Whether the path itself is a symbolic link
    pub is_symlink: bool,
    /// Filesystem identity used for alias folding, when available
    pub identity: Option<FileId>,
}

/// One logical file under consideration for duplicate detection.
///
/// Holds every path known to reach the same content. The alias list is kept
/// sorted; the lexicographically first path is the *primary path*, used for
/// criteria evaluation and report ordering. `root_index` follows the primary
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    paths: Vec<PathBuf>,
    /// File size in bytes, common to every alias
    pub size: u64,
    /// Last modification time, captured at scan time
    pub modified: SystemTime,
    /// 1-based root index of the primary path
    pub root_index: usize,
}

impl Candidate {
    /// Create a candidate from a single discovered entry.
    #[must_use]
    pub fn from_entry(entry: FileEntry) -> Self {
        Self {
            paths: vec![entry.path],
            size: entry.size,
            modified: entry.modified,
            root_index: entry.root_index,
        }
    }

    /// The primary path: lexicographically first among the aliases.
    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.paths[0]
    }

    /// Every path known to reach this content, sorted.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of distinct paths naming this content.
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.paths.len()
    }

    /// Record another path resolving to the same filesystem identity.
    ///
    /// Keeps the alias list sorted and deduplicated. If the new path sorts
    /// first it becomes the primary, and the candidate takes on its root
    /// index. Folding the same path twice is a no-op.
    pub fn add_alias(&mut self, entry: FileEntry) {
        match self.paths.binary_search(&entry.path) {
            Ok(_) => {}
            Err(position) => {
                self.paths.insert(position, entry.path);
                if position == 0 {
                    self.root_index = entry.root_index;
                }
            }
        }
    }
}

/// Errors that can occur during file discovery.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error against the path it occurred on.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Configuration for the walker.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Expand directory roots into their contents.
    pub recurse: bool,

    /// Include symbolic links as candidates (content is read through the
    /// link). When false, symlinks are skipped entirely.
    pub include_symlinks: bool,

    /// Minimum file size to include, in bytes. Zero admits empty files.
    pub min_size: u64,

    /// Collect device+inode identity for alias folding.
    pub collect_identity: bool,

    /// Basenames to exclude, matched literally.
    pub exclude_names: Vec<OsString>,
}
