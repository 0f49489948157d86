//! Size bucketing: the zero-I/O first stage of duplicate detection.

use std::collections::BTreeMap;

use crate::scanner::Candidate;

/// Accumulates candidates keyed by exact byte size.
///
/// Buckets are handed out in descending size order so that the
/// highest-value results come first if a run is aborted midway.
#[derive(Debug, Default)]
pub struct SizeBuckets {
    buckets: BTreeMap<u64, Vec<Candidate>>,
}

impl SizeBuckets {
    /// Create an empty bucket set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate to its size bucket.
    pub fn insert(&mut self, candidate: Candidate) {
        self.buckets.entry(candidate.size).or_default().push(candidate);
    }

    /// Number of distinct sizes seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check whether no candidates have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drain the buckets, largest size first.
    ///
    /// Unless `keep_singletons` is set, buckets whose total path count is
    /// below two are dropped: a lone candidate with a single name can have
    /// no duplicate, while one candidate carrying two alias names is still
    /// reportable. Candidates within a bucket come out ordered by primary
    /// path.
    #[must_use]
    pub fn into_descending(self, keep_singletons: bool) -> Vec<(u64, Vec<Candidate>)> {
        let mut dropped = 0usize;
        let buckets: Vec<(u64, Vec<Candidate>)> = self
            .buckets
            .into_iter()
            .rev()
            .filter_map(|(size, mut candidates)| {
                let names: usize = candidates.iter().map(Candidate::name_count).sum();
                if !keep_singletons && names < 2 {
                    dropped += 1;
                    return None;
                }
                candidates.sort_by(|a, b| a.primary().cmp(b.primary()));
                Some((size, candidates))
            })
            .collect();

        if dropped > 0 {
            log::debug!("dropped {dropped} size buckets with a single name");
        }
        buckets
    }
}
