//! Duplicate detection engine.
//!
//! # Overview
//!
//! The engine runs in two stages:
//! 1. [`bucket`]: candidates are grouped by exact byte size; a file can only
//!    duplicate a file of the same size, which eliminates most of the input
//!    without any I/O.
//! 2. [`partition`]: within a same-size bucket, candidates are split into
//!    equivalence classes by direct byte comparison under a configurable
//!    memory budget. No hashing is involved; two files land in the same
//!    class only when every byte matches.

pub mod bucket;
pub mod partition;

pub use bucket::SizeBuckets;
pub use partition::{
    CancelCheck, PartitionConfig, PartitionOutcome, PartitionStats, Partitioner, ReadFailure,
    DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_MEMORY, MIN_BUFFER_SIZE,
};

use crate::scanner::Candidate;

/// A set of candidates proven to share identical content.
///
/// Produced by the partitioner. A group of one member is only meaningful to
/// callers that want every content class (correlate mode) or alias reporting
/// (one candidate, several names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGroup {
    /// Common size of every member, in bytes
    pub size: u64,
    /// Members, ordered by primary path
    pub members: Vec<Candidate>,
}

impl ContentGroup {
    /// Create a group, ordering members by primary path.
    #[must_use]
    pub fn new(size: u64, mut members: Vec<Candidate>) -> Self {
        members.sort_by(|a, b| a.primary().cmp(b.primary()));
        Self { size, members }
    }

    /// Number of distinct contents-bearing candidates.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.members.len()
    }

    /// Total number of paths across every member's aliases.
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.members.iter().map(Candidate::name_count).sum()
    }

    /// Bytes that would be reclaimed by keeping a single copy.
    #[must_use]
    pub fn excess_bytes(&self) -> u64 {
        self.size * (self.members.len().saturating_sub(1) as u64)
    }
}
