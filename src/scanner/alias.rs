//! Alias folding: collapsing several paths to one logical file.
//!
//! Hardlinks (and symlinks, when they are being followed) give one file
//! content more than one name. Folding those names into a single
//! [`Candidate`] means the comparison engine reads each content once, and
//! reports can show every path that would be affected by an action.
//!
//! Identity is the (device, inode) pair on Unix. On platforms without
//! inode identity, folding degrades to a no-op and every path stands alone.

use std::collections::HashMap;
use std::fs::Metadata;

use super::{Candidate, FileEntry};

/// Platform-specific filesystem identity for alias detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _unsupported: (),
}

impl FileId {
    /// Extract the identity from file metadata.
    ///
    /// Returns `None` where the platform exposes no usable identity.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Accumulates file entries, folding those that share filesystem identity.
///
/// Folding is idempotent and associative: the same entry added twice, or
/// aliases arriving in any order, produce the same candidate set. When
/// disabled, every entry becomes its own candidate and hardlinked copies
/// compare (and report) as ordinary duplicates.
#[derive(Debug, Default)]
pub struct AliasFolder {
    enabled: bool,
    by_identity: HashMap<FileId, usize>,
    candidates: Vec<Candidate>,
}

impl AliasFolder {
    /// Create a folder. `enabled` controls whether folding happens at all.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            by_identity: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    /// Add a discovered entry, folding it into an existing candidate when
    /// its identity has been seen before.
    pub fn add(&mut self, entry: FileEntry) {
        if self.enabled {
            if let Some(identity) = entry.identity {
                if let Some(&slot) = self.by_identity.get(&identity) {
                    log::debug!(
                        "{}: alias of {}",
                        entry.path.display(),
                        self.candidates[slot].primary().display()
                    );
                    self.candidates[slot].add_alias(entry);
                    return;
                }
                self.by_identity.insert(identity, self.candidates.len());
            }
        }
        self.candidates.push(Candidate::from_entry(entry));
    }

    /// Number of distinct candidates accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check whether nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Finish folding and hand over the candidates.
    #[must_use]
    pub fn finish(self) -> Vec<Candidate> {
        self.candidates
    }
}
