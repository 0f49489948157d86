//! Report text format: writer and reader.
//!
//! # Format
//!
//! A report is a sequence of group blocks separated by blank lines. Each
//! block opens with a header comment:
//!
//! ```text
//! ## Size: 10K Instances: 2 Excess: 10K Names: 2
//! > photos/holiday.jpg
//!   backup/holiday.jpg
//! ```
//!
//! and continues with one line per path. The first two characters of a path
//! line are the mark: `> ` preferred, `? ` ambiguous preference, two spaces
//! unmarked. Other lines starting with `#` are comments. Paths are written
//! verbatim; the reader takes everything after the two mark characters.
//!
//! The execute and coalesce modes consume this format, so both sides live
//! together here.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::criteria::Criteria;
use crate::engine::ContentGroup;
use crate::units::format_byte_count;

const MARK_PREFERRED: char = '>';
const MARK_AMBIGUOUS: char = '?';
const MARK_NONE: char = ' ';

/// Writes duplicate groups as report blocks.
///
/// When criteria are present, each group is narrowed on the way out: a lone
/// survivor gets the `> ` mark, several survivors each get `? `. Every alias
/// of a marked candidate shares its mark.
pub struct Reporter<'w> {
    out: &'w mut dyn Write,
    show_aliases: bool,
    criteria: Option<&'w Criteria>,
}

impl<'w> Reporter<'w> {
    /// Create a reporter. `show_aliases` adds a comment above members that
    /// carry more than one name.
    pub fn new(
        out: &'w mut dyn Write,
        show_aliases: bool,
        criteria: Option<&'w Criteria>,
    ) -> Self {
        Self {
            out,
            show_aliases,
            criteria,
        }
    }

    /// Write one group block, trailing blank line included.
    ///
    /// # Errors
    ///
    /// Propagates writer errors.
    pub fn write_group(&mut self, group: &ContentGroup) -> io::Result<()> {
        writeln!(
            self.out,
            "## Size: {} Instances: {} Excess: {} Names: {}",
            format_byte_count(group.size),
            group.instance_count(),
            format_byte_count(group.excess_bytes()),
            group.name_count(),
        )?;

        let marked = match self.criteria {
            Some(criteria) => criteria.select(&group.members),
            None => Vec::new(),
        };
        let mark = if marked.len() == 1 {
            MARK_PREFERRED
        } else {
            MARK_AMBIGUOUS
        };

        for (index, member) in group.members.iter().enumerate() {
            if self.show_aliases && member.name_count() > 1 {
                writeln!(
                    self.out,
                    "# Instance {}: {} names",
                    index + 1,
                    member.name_count()
                )?;
            }

            let member_mark = if marked.contains(&index) { mark } else { MARK_NONE };
            for path in member.paths() {
                writeln!(self.out, "{} {}", member_mark, path.display())?;
            }
        }

        writeln!(self.out)
    }
}

/// One block of a parsed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGroup {
    /// Paths marked `>` or `?`
    pub marked: Vec<PathBuf>,
    /// Paths with no mark
    pub unmarked: Vec<PathBuf>,
}

/// Problems encountered while reading a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportParseError {
    /// A path line without the mandatory space after its mark character.
    #[error("line {line}: expected a space after the mark character")]
    BadMark {
        /// 1-based line number
        line: usize,
    },

    /// A path line with a mark other than `>`, `?` or space.
    #[error("line {line}: unrecognized mark '{mark}'")]
    UnknownMark {
        /// 1-based line number
        line: usize,
        /// The offending character
        mark: char,
    },

    /// A path line with nothing after the mark.
    #[error("line {line}: missing path")]
    MissingPath {
        /// 1-based line number
        line: usize,
    },

    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parse a report into groups.
///
/// Comment lines are skipped, blank lines close the current block, and any
/// malformed path line fails the whole parse - execute mode must not act on
/// a report it cannot fully trust.
///
/// # Errors
///
/// Returns [`ReportParseError`] on the first malformed line or I/O failure.
pub fn parse_report<R: BufRead>(reader: R) -> Result<Vec<ReportGroup>, ReportParseError> {
    let mut groups = Vec::new();
    let mut marked: Vec<PathBuf> = Vec::new();
    let mut unmarked: Vec<PathBuf> = Vec::new();

    let mut flush = |marked: &mut Vec<PathBuf>, unmarked: &mut Vec<PathBuf>| {
        if !marked.is_empty() || !unmarked.is_empty() {
            groups.push(ReportGroup {
                marked: std::mem::take(marked),
                unmarked: std::mem::take(unmarked),
            });
        }
    };

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            flush(&mut marked, &mut unmarked);
            continue;
        }

        let mut chars = line.chars();
        let mark = chars.next().unwrap_or(' ');
        let separator = chars.next();
        let path = chars.as_str();

        if separator != Some(' ') {
            return Err(ReportParseError::BadMark { line: line_number });
        }
        if path.is_empty() {
            return Err(ReportParseError::MissingPath { line: line_number });
        }

        match mark {
            MARK_PREFERRED | MARK_AMBIGUOUS => marked.push(PathBuf::from(path)),
            MARK_NONE => unmarked.push(PathBuf::from(path)),
            other => {
                return Err(ReportParseError::UnknownMark {
                    line: line_number,
                    mark: other,
                })
            }
        }
    }

    flush(&mut marked, &mut unmarked);
    Ok(groups)
}
