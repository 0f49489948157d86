//! The find pipeline: walk, fold aliases, bucket, partition, report.

use std::collections::HashSet;
use std::io::Write;
use std::time::Instant;

use anyhow::Result;

use crate::criteria::Criteria;
use crate::engine::{CancelCheck, PartitionConfig, Partitioner, SizeBuckets};
use crate::progress::{CompareBar, NoProgress, WalkProgress};
use crate::report::Reporter;
use crate::scanner::{AliasFolder, Candidate, Walker, WalkerConfig};
use crate::units::format_duration;

/// Options for one find run.
#[derive(Debug)]
pub struct FindOptions {
    /// Root paths in command-line order
    pub paths: Vec<std::path::PathBuf>,
    /// Expand directory roots
    pub recurse: bool,
    /// Include symlinks as candidates
    pub include_symlinks: bool,
    /// Fold hardlinks (and followed symlinks) and report alias names
    pub detect_aliases: bool,
    /// Drop groups whose members all come from the same root
    pub only_mixed_roots: bool,
    /// Minimum candidate size in bytes
    pub min_size: u64,
    /// Memory budget for comparison buffers
    pub max_memory: u64,
    /// Largest single comparison buffer
    pub max_buffer: u64,
    /// Basenames to exclude, matched literally
    pub exclude_names: Vec<String>,
    /// Compiled preference criteria, if any
    pub criteria: Option<Criteria>,
    /// Show progress displays on the terminal
    pub show_progress: bool,
    /// Append elapsed time to the report
    pub log_time: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            recurse: false,
            include_symlinks: false,
            detect_aliases: false,
            only_mixed_roots: false,
            min_size: 1,
            max_memory: crate::engine::DEFAULT_MAX_MEMORY,
            max_buffer: crate::engine::DEFAULT_MAX_BUFFER_SIZE,
            exclude_names: Vec::new(),
            criteria: None,
            show_progress: false,
            log_time: false,
        }
    }
}

/// What a find run saw and produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct FindSummary {
    /// Files enumerated across all roots
    pub files_seen: u64,
    /// Duplicate groups written
    pub groups_written: u64,
    /// Walk and read errors, all non-fatal
    pub errors: u64,
}

/// Run duplicate detection and stream the report to `out`.
///
/// Enumeration and read errors are logged and counted but do not abort the
/// run; only a writer failure does.
///
/// # Errors
///
/// Returns an error when the report cannot be written.
pub fn scan(options: &FindOptions, out: &mut dyn Write) -> Result<FindSummary> {
    let started = Instant::now();
    let mut summary = FindSummary::default();

    let walker = Walker::new(
        options.paths.clone(),
        WalkerConfig {
            recurse: options.recurse,
            include_symlinks: options.include_symlinks,
            min_size: options.min_size,
            collect_identity: options.detect_aliases,
            exclude_names: options.exclude_names.iter().map(Into::into).collect(),
        },
    );

    log::debug!("start file enumeration");
    let mut walk_progress = WalkProgress::new(options.show_progress);
    let mut folder = AliasFolder::new(options.detect_aliases);
    for item in walker.walk() {
        match item {
            Ok(entry) => {
                walk_progress.tick(&entry.path);
                folder.add(entry);
            }
            Err(error) => {
                summary.errors += 1;
                log::warn!("{error}");
            }
        }
    }
    summary.files_seen = walk_progress.files_seen();
    walk_progress.finish();
    log::debug!(
        "end file enumeration: files={} errors={}",
        summary.files_seen,
        summary.errors
    );

    let mut buckets = SizeBuckets::new();
    for candidate in folder.finish() {
        buckets.insert(candidate);
    }
    log::debug!("distinct sizes: {}", buckets.len());

    let partitioner = Partitioner::new(PartitionConfig {
        max_memory: options.max_memory,
        max_buffer: options.max_buffer,
    });

    let single_root = |members: &[&Candidate]| {
        let roots: HashSet<usize> = members.iter().map(|m| m.root_index).collect();
        roots.len() <= 1
    };
    let cancel: Option<CancelCheck<'_>> = if options.only_mixed_roots {
        Some(&single_root)
    } else {
        None
    };

    let mut reporter = Reporter::new(out, options.detect_aliases, options.criteria.as_ref());
    let mut groups_written = 0u64;
    let mut read_errors = 0u64;

    for (size, candidates) in buckets.into_descending(false) {
        log::debug!(
            "content comparison start: {} instances of {} bytes each",
            candidates.len(),
            size
        );

        let outcome = if options.show_progress {
            let bar = CompareBar::new(size);
            partitioner.partition(size, candidates, cancel, &bar)
        } else {
            partitioner.partition(size, candidates, cancel, &NoProgress)
        };

        read_errors += outcome.failures.len() as u64;

        for group in outcome.classes {
            let reportable = group.instance_count() >= 2
                || (options.detect_aliases && group.name_count() >= 2);
            if reportable {
                groups_written += 1;
                reporter.write_group(&group)?;
            }
        }

        log::debug!(
            "content comparison end: bytes_read={} completed={} early_out={} canceled={}",
            outcome.stats.bytes_read,
            outcome.stats.completed,
            outcome.stats.early_out,
            outcome.stats.canceled
        );
    }

    summary.groups_written = groups_written;
    summary.errors += read_errors;

    if options.log_time {
        writeln!(out, "# Elapsed time: {}", format_duration(started.elapsed()))?;
    }

    Ok(summary)
}
