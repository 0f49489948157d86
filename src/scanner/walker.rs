//! Root traversal: turning command-line paths into file entries.
//!
//! Each positional argument is a *root*. A root naming a regular file yields
//! itself; a root naming a directory expands only when recursion is enabled.
//! Directory children are visited in name order (via [`jwalk`] with sorted
//! read-dirs) so that enumeration is deterministic. Repeated paths are
//! reported once, first occurrence winning.
//!
//! Metadata is taken through symlinks, so a symlink candidate carries its
//! target's size and identity - reading the link reads the target's bytes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;

use super::{FileEntry, FileId, ScanError, WalkerConfig};

/// Walks a sequence of root paths, yielding candidate file entries.
#[derive(Debug)]
pub struct Walker {
    roots: Vec<PathBuf>,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker over the given roots. Root indexes are assigned from
    /// the order of `roots`, starting at 1.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self { roots, config }
    }

    /// Walk every root in order, yielding file entries and per-path errors.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration; the caller decides whether to log or abort.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        self.roots
            .iter()
            .enumerate()
            .flat_map(move |(position, root)| self.walk_root(position + 1, root))
            .filter(move |result| match result {
                Ok(entry) => seen.insert(entry.path.clone()),
                Err(_) => true,
            })
    }

    fn walk_root<'a>(
        &'a self,
        root_index: usize,
        root: &'a Path,
    ) -> Box<dyn Iterator<Item = Result<FileEntry, ScanError>> + 'a> {
        let metadata = match fs::symlink_metadata(root) {
            Ok(metadata) => metadata,
            Err(error) => return Box::new(std::iter::once(Err(ScanError::from_io(root, error)))),
        };

        if metadata.is_dir() {
            if !self.config.recurse {
                log::warn!(
                    "{}: is a directory; use --recurse to scan its contents",
                    root.display()
                );
                return Box::new(std::iter::empty());
            }
            return self.walk_directory(root_index, root);
        }

        // The root names a file (or a symlink) directly.
        let is_symlink = metadata.file_type().is_symlink();
        if is_symlink && !self.config.include_symlinks {
            log::debug!("{}: skipping symlink", root.display());
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.examine(root.to_path_buf(), is_symlink, root_index)
                .into_iter(),
        )
    }

    fn walk_directory<'a>(
        &'a self,
        root_index: usize,
        root: &'a Path,
    ) -> Box<dyn Iterator<Item = Result<FileEntry, ScanError>> + 'a> {
        let walk_dir = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic enumeration
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(walk_dir.into_iter().filter_map(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    let is_symlink = file_type.is_symlink();
                    if is_symlink && !self.config.include_symlinks {
                        log::trace!("{}: skipping symlink", entry.path().display());
                        return None;
                    }

                    self.examine(entry.path(), is_symlink, root_index)
                }
                Err(error) => {
                    let path = error
                        .path()
                        .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                    let source = std::io::Error::other(error.to_string());
                    Some(Err(ScanError::Io { path, source }))
                }
            }
        }))
    }

    /// Stat a discovered path and apply the configured filters.
    fn examine(
        &self,
        path: PathBuf,
        is_symlink: bool,
        root_index: usize,
    ) -> Option<Result<FileEntry, ScanError>> {
        // Follow symlinks: a symlink candidate's content is its target's bytes.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => return Some(Err(ScanError::from_io(&path, error))),
        };

        if !metadata.is_file() {
            return None;
        }

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!("{}: below minimum size ({})", path.display(), size);
            return None;
        }

        if let Some(name) = path.file_name() {
            if self
                .config
                .exclude_names
                .iter()
                .any(|excluded| excluded.as_os_str() == name)
            {
                log::debug!("{}: excluded by name", path.display());
                return None;
            }
        }

        let identity = if self.config.collect_identity {
            FileId::from_metadata(&metadata)
        } else {
            None
        };

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Some(Ok(FileEntry {
            path,
            size,
            modified,
            root_index,
            is_symlink,
            identity,
        }))
    }
}
