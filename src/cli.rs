//! Command-line interface definitions.
//!
//! Two subcommands cover the two modes: `find` scans for duplicate content
//! (and doubles as the entry point for report execution), `correlate` diffs
//! two directory trees by content.
//!
//! # Example
//!
//! ```bash
//! # Find duplicates under two trees, preferring the shortest path
//! bytedupe find -r --prefer "shorter path" ~/photos ~/backup
//!
//! # Review, then delete everything the report left unmarked
//! bytedupe find -r --prefer "shorter path" ~/photos ~/backup > dupes.txt
//! bytedupe find --execute dupes.txt --dry-run
//! bytedupe find --execute dupes.txt
//!
//! # What changed between two snapshots?
//! bytedupe correlate snapshot-2023 snapshot-2024
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::units::parse_byte_count;

const BYTE_COUNT_HELP: &str = "Arguments that accept byte counts take an integer with an optional \
unit suffix: 'B' for bytes (the default when no suffix is given), 'K' for kibibytes (1024 \
bytes), 'M' for mebibytes, 'G' for gibibytes, 'T' for tebibytes.";

/// Detailed help for the `--prefer` criteria language, printed by
/// `--help-prefer`.
pub const PREFER_HELP: &str = r#"The --prefer option takes a criteria expression that picks, for every
group of identical files, the member(s) worth keeping. The rest of the
group can then be deleted with --execute or hardlinked with --coalesce.

An expression is a comma-separated list of phrases. Each phrase narrows
the current selection; a phrase that would eliminate every remaining
member changes nothing. Evaluation stops once one member remains. If a
single member survives, it is marked '>' in the report; members tied
after the last phrase are marked '?'.

Boolean phrases:  PROPERTY OPERATOR ARGUMENT [ignoring case]

    name is photo.jpg
    path not contains /attic/, name ends with .jpg
    directory name matches re ^(backup|mirror)$ ignoring case

Extrema phrases:  ADJECTIVE PROPERTY [ignoring case]

    shorter path
    earlier mtime
    shorter path, earlier path

Properties:
    path                the path as it was found
    name                the part after the last path separator
    dir, directory      everything up to and including the last separator
    directory name      the last component of the directory
    ext, extension      the final dot-suffix of the name, dot included
    mtime               modification time (extrema phrases only)
    index               1-based position of the root argument the file
                        was found under

Operators (each has a negation: 'is not', 'not contains', ...):
    is, contains, starts with, ends with, matches re

Adjectives:
    shorter/longer      character length of a string property
    shallower/deeper    number of path separators
    earlier/later       the property's natural order (time, number, text)
    lower/higher        same as earlier/later

Arguments with spaces can be quoted with single or double quotes, or the
space escaped with a backslash. 'matches re' uses Rust regex syntax
(https://docs.rs/regex), anchored at the start of the value; 'ignoring
case' switches the engine's case-insensitive flag rather than rewriting
the pattern.

When alias detection (-a) has folded several names into one file, criteria
see only the lexicographically first name; every alias shares its mark.
"#;

/// Find files with identical content.
///
/// Detection is by direct byte comparison - no hashing - so two files are
/// reported together exactly when every byte matches.
#[derive(Debug, Parser)]
#[command(name = "bytedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find files with identical content
    Find(FindArgs),
    /// Compare two directory trees by content
    Correlate(CorrelateArgs),
}

/// Arguments for find mode.
#[derive(Debug, Args)]
#[command(after_help = BYTE_COUNT_HELP)]
pub struct FindArgs {
    /// Files to consider; directories expand with -r/--recurse
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Include symlinks (content is read through the link)
    #[arg(short = 's', long)]
    pub symlinks: bool,

    /// Include zero-length files; equivalent to --min-size 0
    #[arg(short = 'z', long)]
    pub zero: bool,

    /// Detect when one file has several names (hardlinks, and symlinks
    /// with -s); folded names share one comparison and one mark
    #[arg(short = 'a', long)]
    pub aliases: bool,

    /// Recurse into subdirectories
    #[arg(short = 'r', long)]
    pub recurse: bool,

    /// Only report groups spanning two or more root arguments
    #[arg(short = 'o', long)]
    pub only_mixed_roots: bool,

    /// Ignore files smaller than SIZE (byte count; default 1)
    #[arg(short = 'm', long, value_name = "SIZE", value_parser = parse_byte_count)]
    pub min_size: Option<u64>,

    /// Largest single comparison buffer (byte count)
    #[arg(long, value_name = "SIZE", value_parser = parse_byte_count, default_value = "1M")]
    pub max_buffer: u64,

    /// Memory budget for comparison buffers per group (byte count)
    #[arg(long, value_name = "SIZE", value_parser = parse_byte_count, default_value = "256M")]
    pub max_memory: u64,

    /// Skip files with this exact name; may be repeated
    #[arg(long, value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Mark one file per group for preservation according to CRITERIA;
    /// see --help-prefer
    #[arg(short = 'p', long, value_name = "CRITERIA")]
    pub prefer: Option<String>,

    /// Show detailed help for the --prefer criteria language
    #[arg(long)]
    pub help_prefer: bool,

    /// Append the elapsed time to the report
    #[arg(long)]
    pub time: bool,

    /// Log detailed information to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Show progress on the terminal while scanning and comparing
    #[arg(long)]
    pub progress: bool,

    /// Delete the unmarked files listed in the report at PATH
    #[arg(short = 'x', long, value_name = "PATH", conflicts_with = "coalesce")]
    pub execute: Option<PathBuf>,

    /// Replace the unmarked files listed in the report at PATH with hard
    /// links to the marked one
    #[arg(long, value_name = "PATH")]
    pub coalesce: Option<PathBuf>,

    /// With --execute or --coalesce: list the actions without doing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Arguments for correlate mode.
#[derive(Debug, Args)]
#[command(after_help = BYTE_COUNT_HELP)]
pub struct CorrelateArgs {
    /// The two directories to compare
    #[arg(value_name = "DIR", num_args = 2, required = true)]
    pub dirs: Vec<PathBuf>,

    /// List content that appears in both directories
    #[arg(short = 'm', long)]
    pub matches: bool,

    /// List content that appears only under the first directory
    #[arg(short = 'r', long)]
    pub removes: bool,

    /// List content that appears only under the second directory
    #[arg(short = 'a', long)]
    pub adds: bool,

    /// Colorize output
    #[arg(short = 'c', long, value_enum, default_value_t = ColorMode::Auto)]
    pub colorize: ColorMode,

    /// Suppress the summary line
    #[arg(long)]
    pub no_summary: bool,

    /// Memory budget for comparison buffers per group (byte count)
    #[arg(long, value_name = "SIZE", value_parser = parse_byte_count, default_value = "256M")]
    pub max_memory: u64,

    /// Largest single comparison buffer (byte count)
    #[arg(long, value_name = "SIZE", value_parser = parse_byte_count, default_value = "1M")]
    pub max_buffer: u64,

    /// Log detailed information to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Colorize when stdout is a terminal
    Auto,
    /// Always colorize
    On,
    /// Never colorize
    Off,
}
