//! Coalescing duplicates into hard links.
//!
//! Each unmarked path in a block is replaced by a hard link to the block's
//! first marked path. The replacement goes through a temporary link name in
//! the same directory followed by a rename, so the path never dangles even
//! if the process dies mid-way.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::ActionStats;
use crate::report::parse_report;

/// Replace the unmarked paths of every block that has a marked path with
/// hard links to that block's first marked path. Each replacement is echoed
/// to `out` as `path <= target`; failures are appended and counted.
///
/// Under `dry_run` nothing is linked and the listing shows what would be.
///
/// # Errors
///
/// Returns an error if the report cannot be opened or parsed; per-path link
/// failures are counted in the stats instead.
pub fn coalesce_report(
    report_path: &Path,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<ActionStats> {
    let file = File::open(report_path)
        .with_context(|| format!("cannot open report {}", report_path.display()))?;
    let groups = parse_report(BufReader::new(file))
        .with_context(|| format!("cannot parse report {}", report_path.display()))?;

    let mut stats = ActionStats::default();

    for group in groups {
        let Some(target) = group.marked.first() else {
            log::debug!("skipping a group with no marked member");
            stats.skipped_groups += 1;
            continue;
        };

        for path in &group.unmarked {
            write!(out, "{} <= {}", path.display(), target.display())?;
            stats.actions += 1;

            if !dry_run {
                if let Err(error) = replace_with_link(target, path) {
                    write!(out, ": {error}")?;
                    stats.failures += 1;
                }
            }
            writeln!(out)?;
        }
    }

    Ok(stats)
}

/// Atomically replace `path` with a hard link to `target`.
fn replace_with_link(target: &Path, path: &Path) -> std::io::Result<()> {
    let staging = staging_name(path);
    fs::hard_link(target, &staging)?;
    if let Err(error) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

fn staging_name(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".coalesce-tmp");
    path.with_file_name(name)
}
