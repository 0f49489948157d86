//! Byte-equality partitioning of same-size candidates.
//!
//! # Overview
//!
//! Given N candidates of common size S, the partitioner produces the exact
//! equivalence classes under byte-for-byte equality. All members of a
//! sub-group advance through their files in lockstep, one buffer per round;
//! members whose buffers differ split into separate sub-groups, and a
//! sub-group reduced to one member stops reading immediately. Per-round
//! buffer sizes are chosen so that total buffer memory stays within the
//! configured budget.
//!
//! When the candidate count is too large for every member to hold even a
//! minimum buffer within the budget, the group falls back to a wave
//! strategy: one reference candidate is compared against bounded chunks of
//! the others, splitting the set into "equal to reference" and "not equal to
//! reference", and the latter pool is reworked with a fresh reference.
//!
//! A read error ejects the failing candidate from its sub-group - it is
//! neither equal nor unequal to the others - and comparison continues for
//! the rest. A read that ends before the recorded size is treated the same
//! way, with a distinct diagnostic.

use std::fs::File;
use std::io::{self, Read};
use std::mem;
use std::path::PathBuf;

use crate::engine::ContentGroup;
use crate::progress::CompareProgress;
use crate::scanner::Candidate;

/// Smallest buffer ever used for comparison reads.
pub const MIN_BUFFER_SIZE: u64 = 4096;
/// Default cap on the per-file buffer size.
pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 1024 * 1024;
/// Default cap on total comparison memory per group.
pub const DEFAULT_MAX_MEMORY: u64 = 256 * 1024 * 1024;

/// Report comparison progress after this many additional bytes read.
const PROGRESS_INTERVAL: u64 = 1024 * 1024;

/// Memory limits for a [`Partitioner`].
#[derive(Debug, Clone, Copy)]
pub struct PartitionConfig {
    /// Total buffer memory allowed per group, in bytes.
    pub max_memory: u64,
    /// Largest single read buffer, in bytes.
    pub max_buffer: u64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY,
            max_buffer: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

/// A candidate ejected from comparison by an I/O failure.
#[derive(Debug)]
pub struct ReadFailure {
    /// Primary path of the ejected candidate
    pub path: PathBuf,
    /// The error that caused the ejection
    pub error: io::Error,
}

/// Counters describing one partitioning run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartitionStats {
    /// Bytes read across all candidates
    pub bytes_read: u64,
    /// Classes proven equal through end of file
    pub completed: usize,
    /// Sub-groups that stopped early with a single member
    pub early_out: usize,
    /// Sub-groups dropped by the cancellation predicate
    pub canceled: usize,
}

/// Result of partitioning one size bucket.
#[derive(Debug)]
pub struct PartitionOutcome {
    /// Equivalence classes, including singletons, ordered by the first
    /// member's primary path
    pub classes: Vec<ContentGroup>,
    /// Candidates ejected by I/O failures
    pub failures: Vec<ReadFailure>,
    /// Run counters
    pub stats: PartitionStats,
}

/// Predicate consulted once per sub-group round; returning `true` drops the
/// sub-group without emitting anything.
pub type CancelCheck<'a> = &'a dyn Fn(&[&Candidate]) -> bool;

/// Splits same-size candidate sets into byte-equality classes.
#[derive(Debug)]
pub struct Partitioner {
    config: PartitionConfig,
}

impl Partitioner {
    /// Create a partitioner, clamping limits to the minimum buffer size.
    #[must_use]
    pub fn new(config: PartitionConfig) -> Self {
        let mut config = config;
        if config.max_buffer < MIN_BUFFER_SIZE {
            log::debug!(
                "max buffer {} raised to the {} minimum",
                config.max_buffer,
                MIN_BUFFER_SIZE
            );
            config.max_buffer = MIN_BUFFER_SIZE;
        }
        if config.max_memory < MIN_BUFFER_SIZE {
            log::debug!(
                "max memory {} raised to the {} minimum",
                config.max_memory,
                MIN_BUFFER_SIZE
            );
            config.max_memory = MIN_BUFFER_SIZE;
        }
        Self { config }
    }

    /// Partition `candidates`, all of recorded size `size`, into
    /// byte-equality classes.
    ///
    /// The outcome includes singleton classes; callers that only want
    /// duplicates filter on member count. Output order is deterministic for
    /// a given input set.
    #[must_use]
    pub fn partition(
        &self,
        size: u64,
        candidates: Vec<Candidate>,
        cancel: Option<CancelCheck<'_>>,
        progress: &dyn CompareProgress,
    ) -> PartitionOutcome {
        let mut outcome = PartitionOutcome {
            classes: Vec::new(),
            failures: Vec::new(),
            stats: PartitionStats::default(),
        };

        if candidates.is_empty() {
            return outcome;
        }

        if let Some(cancel) = cancel {
            let refs: Vec<&Candidate> = candidates.iter().collect();
            if cancel(&refs) {
                outcome.stats.canceled += 1;
                return outcome;
            }
        }

        // Zero-length files are all identical; a lone candidate has nothing
        // to be compared against. Neither needs any I/O.
        if size == 0 || candidates.len() == 1 {
            outcome.stats.completed += 1;
            outcome.classes.push(ContentGroup::new(size, candidates));
            return outcome;
        }

        if candidates.len() as u64 * MIN_BUFFER_SIZE > self.config.max_memory {
            log::debug!(
                "{} candidates exceed the memory budget; using wave comparison",
                candidates.len()
            );
            self.wave_partition(size, candidates, cancel, progress, &mut outcome);
        } else {
            self.lockstep_partition(size, candidates, cancel, progress, &mut outcome);
        }

        outcome
            .classes
            .sort_by(|a, b| a.members[0].primary().cmp(b.members[0].primary()));
        progress.clear();
        outcome
    }

    /// Advance every sub-group member through its file in lockstep,
    /// splitting on the first differing buffer.
    fn lockstep_partition(
        &self,
        size: u64,
        candidates: Vec<Candidate>,
        cancel: Option<CancelCheck<'_>>,
        progress: &dyn CompareProgress,
        outcome: &mut PartitionOutcome,
    ) {
        let mut members = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match File::open(candidate.primary()) {
                Ok(file) => members.push((candidate, file)),
                Err(error) => eject(&mut outcome.failures, candidate, error),
            }
        }

        let mut throttle = ProgressThrottle::default();
        let mut pending: Vec<(Vec<(Candidate, File)>, u64)> = vec![(members, 0)];

        while let Some((members, offset)) = pending.pop() {
            if members.is_empty() {
                continue;
            }

            if let Some(cancel) = cancel {
                let refs: Vec<&Candidate> = members.iter().map(|(c, _)| c).collect();
                if cancel(&refs) {
                    outcome.stats.canceled += 1;
                    continue;
                }
            }

            // Ejections can leave a sole survivor; it needs no further reads.
            if members.len() == 1 {
                outcome.stats.early_out += 1;
                finalize(outcome, size, members);
                continue;
            }

            // The first round reads small to split early divergers cheaply.
            let buffer_size = if offset == 0 {
                MIN_BUFFER_SIZE
            } else {
                (self.config.max_memory / members.len() as u64)
                    .clamp(MIN_BUFFER_SIZE, self.config.max_buffer)
            };
            let want = buffer_size.min(size - offset) as usize;

            let mut buckets: Vec<(Vec<u8>, Vec<(Candidate, File)>)> = Vec::new();
            for (candidate, mut file) in members {
                let mut buffer = vec![0u8; want];
                match read_full(&mut file, &mut buffer) {
                    Ok(()) => {
                        outcome.stats.bytes_read += want as u64;
                        match buckets.iter_mut().find(|(bytes, _)| *bytes == buffer) {
                            Some((_, set)) => set.push((candidate, file)),
                            None => buckets.push((buffer, vec![(candidate, file)])),
                        }
                    }
                    Err(error) => eject(&mut outcome.failures, candidate, error),
                }
            }

            let next_offset = offset + want as u64;
            throttle.maybe_update(outcome.stats.bytes_read, next_offset, size, progress);

            for (_, set) in buckets {
                if next_offset == size {
                    outcome.stats.completed += 1;
                    finalize(outcome, size, set);
                } else if set.len() == 1 {
                    // Diverged from every sibling; no further reads needed.
                    outcome.stats.early_out += 1;
                    finalize(outcome, size, set);
                } else {
                    pending.push((set, next_offset));
                }
            }
        }
    }

    /// Compare a reference candidate against bounded chunks of the rest.
    ///
    /// Memory use is two minimum-size buffers; the chunk width bounds how
    /// many file handles are open at once. Divergent members stop reading
    /// and wait for the next wave's reference.
    fn wave_partition(
        &self,
        size: u64,
        candidates: Vec<Candidate>,
        cancel: Option<CancelCheck<'_>>,
        progress: &dyn CompareProgress,
        outcome: &mut PartitionOutcome,
    ) {
        let chunk_width = ((self.config.max_memory / MIN_BUFFER_SIZE).saturating_sub(1)).max(1) as usize;
        let mut throttle = ProgressThrottle::default();
        let mut pool = candidates;

        while pool.len() > 1 {
            if let Some(cancel) = cancel {
                let refs: Vec<&Candidate> = pool.iter().collect();
                if cancel(&refs) {
                    outcome.stats.canceled += 1;
                    return;
                }
            }

            let reference = pool.remove(0);
            let mut pending = mem::take(&mut pool);
            let mut equal: Vec<Candidate> = Vec::new();
            let mut unequal: Vec<Candidate> = Vec::new();
            let mut reference_alive = true;

            while !pending.is_empty() {
                let take = pending.len().min(chunk_width);
                let chunk: Vec<Candidate> = pending.drain(..take).collect();

                match self.compare_chunk(size, &reference, chunk, &mut throttle, progress, outcome) {
                    ChunkOutcome::Done {
                        equal: chunk_equal,
                        unequal: chunk_unequal,
                    } => {
                        equal.extend(chunk_equal);
                        unequal.extend(chunk_unequal);
                    }
                    ChunkOutcome::ReferenceFailed { unresolved } => {
                        // The reference is gone; anything not yet proven
                        // equal goes back for a fresh wave.
                        unequal.extend(unresolved);
                        unequal.append(&mut pending);
                        reference_alive = false;
                        break;
                    }
                }
            }

            if reference_alive {
                let mut class = vec![reference];
                class.extend(equal);
                outcome.stats.completed += 1;
                outcome.classes.push(ContentGroup::new(size, class));
            } else if !equal.is_empty() {
                // Members proven equal to the lost reference end-to-end are
                // equal to each other; they still form a class.
                outcome.stats.completed += 1;
                outcome.classes.push(ContentGroup::new(size, equal));
            }

            pool = unequal;
        }

        if let Some(last) = pool.pop() {
            outcome.stats.early_out += 1;
            outcome.classes.push(ContentGroup::new(size, vec![last]));
        }
    }

    fn compare_chunk(
        &self,
        size: u64,
        reference: &Candidate,
        chunk: Vec<Candidate>,
        throttle: &mut ProgressThrottle,
        progress: &dyn CompareProgress,
        outcome: &mut PartitionOutcome,
    ) -> ChunkOutcome {
        let mut reference_file = match File::open(reference.primary()) {
            Ok(file) => file,
            Err(error) => {
                log::warn!(
                    "{}: ejected from comparison: {}",
                    reference.primary().display(),
                    error
                );
                outcome.failures.push(ReadFailure {
                    path: reference.primary().to_path_buf(),
                    error,
                });
                return ChunkOutcome::ReferenceFailed { unresolved: chunk };
            }
        };

        let mut alive: Vec<(Candidate, File)> = Vec::with_capacity(chunk.len());
        for candidate in chunk {
            match File::open(candidate.primary()) {
                Ok(file) => alive.push((candidate, file)),
                Err(error) => eject(&mut outcome.failures, candidate, error),
            }
        }

        let mut unequal: Vec<Candidate> = Vec::new();
        let mut reference_buffer = vec![0u8; MIN_BUFFER_SIZE as usize];
        let mut scratch = vec![0u8; MIN_BUFFER_SIZE as usize];
        let mut offset = 0u64;

        while offset < size && !alive.is_empty() {
            let want = MIN_BUFFER_SIZE.min(size - offset) as usize;

            if let Err(error) = read_full(&mut reference_file, &mut reference_buffer[..want]) {
                log::warn!(
                    "{}: ejected from comparison: {}",
                    reference.primary().display(),
                    error
                );
                outcome.failures.push(ReadFailure {
                    path: reference.primary().to_path_buf(),
                    error,
                });
                let mut unresolved: Vec<Candidate> =
                    alive.into_iter().map(|(candidate, _)| candidate).collect();
                unresolved.extend(unequal);
                return ChunkOutcome::ReferenceFailed { unresolved };
            }
            outcome.stats.bytes_read += want as u64;

            let mut next_alive = Vec::with_capacity(alive.len());
            for (candidate, mut file) in alive {
                match read_full(&mut file, &mut scratch[..want]) {
                    Ok(()) => {
                        outcome.stats.bytes_read += want as u64;
                        if scratch[..want] == reference_buffer[..want] {
                            next_alive.push((candidate, file));
                        } else {
                            unequal.push(candidate);
                        }
                    }
                    Err(error) => eject(&mut outcome.failures, candidate, error),
                }
            }
            alive = next_alive;
            offset += want as u64;
            throttle.maybe_update(outcome.stats.bytes_read, offset, size, progress);
        }

        ChunkOutcome::Done {
            equal: alive.into_iter().map(|(candidate, _)| candidate).collect(),
            unequal,
        }
    }
}

enum ChunkOutcome {
    Done {
        equal: Vec<Candidate>,
        unequal: Vec<Candidate>,
    },
    ReferenceFailed {
        unresolved: Vec<Candidate>,
    },
}

#[derive(Default)]
struct ProgressThrottle {
    last: u64,
}

impl ProgressThrottle {
    fn maybe_update(
        &mut self,
        bytes_read: u64,
        offset: u64,
        total: u64,
        progress: &dyn CompareProgress,
    ) {
        if bytes_read - self.last >= PROGRESS_INTERVAL {
            self.last = bytes_read;
            progress.update(offset, total);
        }
    }
}

fn finalize(outcome: &mut PartitionOutcome, size: u64, members: Vec<(Candidate, File)>) {
    let candidates = members.into_iter().map(|(candidate, _)| candidate).collect();
    outcome.classes.push(ContentGroup::new(size, candidates));
}

fn eject(failures: &mut Vec<ReadFailure>, candidate: Candidate, error: io::Error) {
    log::warn!(
        "{}: ejected from comparison: {}",
        candidate.primary().display(),
        error
    );
    failures.push(ReadFailure {
        path: candidate.primary().to_path_buf(),
        error,
    });
}

/// Fill `buffer` completely from `file`.
///
/// Candidates in a sub-group share a size, so every member must be able to
/// supply the full requested count; running dry early means the file
/// shrank since it was scanned.
fn read_full(file: &mut File, buffer: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    while filled < buffer.len() {
        let count = file.read(&mut buffer[filled..])?;
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file is shorter than its recorded size",
            ));
        }
        filled += count;
    }
    Ok(())
}
