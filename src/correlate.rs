//! Correlate mode: diff two directory trees by content.
//!
//! Both trees are enumerated in full, and every content class produced by
//! the partitioner is classified by which tree its members came from:
//! present in both is a **match**, only in the left tree a **remove**, only
//! in the right an **add**. Whether two files "are the same" is decided by
//! their bytes alone; names and locations play no part.

use std::io::Write;

use anyhow::Result;

use crate::engine::{ContentGroup, PartitionConfig, Partitioner, SizeBuckets};
use crate::progress::NoProgress;
use crate::scanner::{AliasFolder, Walker, WalkerConfig};
use crate::units::format_byte_count;

/// Classification of one content class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Content present under both roots
    Match,
    /// Content present only under the left root
    Remove,
    /// Content present only under the right root
    Add,
}

impl Disposition {
    fn symbol(self) -> char {
        match self {
            Self::Match => '=',
            Self::Remove => '-',
            Self::Add => '+',
        }
    }

    /// ANSI SGR parameter for colorized output, if any.
    fn sgr(self) -> Option<&'static str> {
        match self {
            Self::Match => None,
            Self::Remove => Some("31"),
            Self::Add => Some("32"),
        }
    }

    fn summary_word(self) -> &'static str {
        match self {
            Self::Match => "Matches",
            Self::Remove => "Removes",
            Self::Add => "Adds",
        }
    }
}

/// Options for one correlate run.
#[derive(Debug)]
pub struct CorrelateOptions {
    /// Left tree root
    pub left: std::path::PathBuf,
    /// Right tree root
    pub right: std::path::PathBuf,
    /// Print matched content
    pub show_matches: bool,
    /// Print content unique to the left tree
    pub show_removes: bool,
    /// Print content unique to the right tree
    pub show_adds: bool,
    /// Emit ANSI colors
    pub color: bool,
    /// Print the trailing summary line
    pub summary: bool,
    /// Memory budget for comparison buffers
    pub max_memory: u64,
    /// Largest single comparison buffer
    pub max_buffer: u64,
}

impl CorrelateOptions {
    /// Options for comparing `left` against `right`, everything shown.
    #[must_use]
    pub fn new(left: std::path::PathBuf, right: std::path::PathBuf) -> Self {
        Self {
            left,
            right,
            show_matches: true,
            show_removes: true,
            show_adds: true,
            color: false,
            summary: true,
            max_memory: crate::engine::DEFAULT_MAX_MEMORY,
            max_buffer: crate::engine::DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

/// File and byte counts for one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionTally {
    /// Paths counted in this section
    pub files: u64,
    /// Bytes across those paths
    pub bytes: u64,
}

/// Totals for a correlate run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrelateSummary {
    /// Content present in both trees
    pub matches: SectionTally,
    /// Content only in the left tree
    pub removes: SectionTally,
    /// Content only in the right tree
    pub adds: SectionTally,
}

impl CorrelateSummary {
    fn tally(&mut self, disposition: Disposition) -> &mut SectionTally {
        match disposition {
            Disposition::Match => &mut self.matches,
            Disposition::Remove => &mut self.removes,
            Disposition::Add => &mut self.adds,
        }
    }

    fn get(&self, disposition: Disposition) -> SectionTally {
        match disposition {
            Disposition::Match => self.matches,
            Disposition::Remove => self.removes,
            Disposition::Add => self.adds,
        }
    }
}

const LEFT_ROOT: usize = 1;

/// Compare two trees and stream the report to `out`.
///
/// # Errors
///
/// Returns an error when the report cannot be written. Unreadable files are
/// logged and skipped, like in find mode.
pub fn correlate(options: &CorrelateOptions, out: &mut dyn Write) -> Result<CorrelateSummary> {
    let walker = Walker::new(
        vec![options.left.clone(), options.right.clone()],
        WalkerConfig {
            recurse: true,
            include_symlinks: false,
            min_size: 0,
            collect_identity: false,
            exclude_names: Vec::new(),
        },
    );

    let mut folder = AliasFolder::new(false);
    let mut errors = 0u64;
    for item in walker.walk() {
        match item {
            Ok(entry) => folder.add(entry),
            Err(error) => {
                errors += 1;
                log::warn!("{error}");
            }
        }
    }
    if errors > 0 {
        log::warn!("{errors} paths could not be read");
    }

    let mut buckets = SizeBuckets::new();
    for candidate in folder.finish() {
        buckets.insert(candidate);
    }

    let partitioner = Partitioner::new(PartitionConfig {
        max_memory: options.max_memory,
        max_buffer: options.max_buffer,
    });

    let mut summary = CorrelateSummary::default();

    for (size, candidates) in buckets.into_descending(true) {
        let outcome = partitioner.partition(size, candidates, None, &NoProgress);

        for group in &outcome.classes {
            let disposition = classify(group);
            let tally = summary.tally(disposition);
            tally.files += group.name_count() as u64;
            tally.bytes += group.size * group.name_count() as u64;

            if included(options, disposition) {
                print_class(out, group, disposition, options.color)?;
            }
        }
    }

    if options.summary {
        let sections = [Disposition::Match, Disposition::Add, Disposition::Remove]
            .iter()
            .map(|&disposition| {
                let tally = summary.get(disposition);
                format!(
                    "{}: {} files ({})",
                    disposition.summary_word(),
                    tally.files,
                    format_byte_count(tally.bytes)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "# {sections}")?;
    }

    Ok(summary)
}

fn classify(group: &ContentGroup) -> Disposition {
    let mut left = false;
    let mut right = false;
    for member in &group.members {
        if member.root_index == LEFT_ROOT {
            left = true;
        } else {
            right = true;
        }
    }
    match (left, right) {
        (true, true) => Disposition::Match,
        (true, false) => Disposition::Remove,
        (false, true) => Disposition::Add,
        (false, false) => unreachable!("content class with no members"),
    }
}

fn included(options: &CorrelateOptions, disposition: Disposition) -> bool {
    match disposition {
        Disposition::Match => options.show_matches,
        Disposition::Remove => options.show_removes,
        Disposition::Add => options.show_adds,
    }
}

/// Print one content class: the section symbol on the first line, the rest
/// indented, left-tree paths before right-tree paths.
fn print_class(
    out: &mut dyn Write,
    group: &ContentGroup,
    disposition: Disposition,
    color: bool,
) -> std::io::Result<()> {
    let mut members: Vec<_> = group.members.iter().collect();
    members.sort_by_key(|member| (member.root_index, member.primary().to_path_buf()));

    let mut symbol = disposition.symbol();
    for member in members {
        for path in member.paths() {
            let line = format!("{} {}", symbol, path.display());
            match disposition.sgr().filter(|_| color) {
                Some(sgr) => writeln!(out, "\x1b[{sgr}m{line}\x1b[0m")?,
                None => writeln!(out, "{line}")?,
            }
            symbol = ' ';
        }
    }
    writeln!(out)
}
