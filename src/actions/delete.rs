//! Deletion of unmarked duplicates listed in a report.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::ActionStats;
use crate::report::parse_report;

/// Delete the unmarked paths of every report block that has at least one
/// marked path. Each deleted (or to-be-deleted) path is echoed to `out`;
/// failures are appended to the echoed line and counted.
///
/// Under `dry_run` nothing is removed and the listing shows what would be.
///
/// # Errors
///
/// Returns an error if the report cannot be opened or parsed; per-path
/// deletion failures are counted in the stats instead.
pub fn execute_report(
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
        if group.marked.is_empty() {
            log::debug!("skipping a group with no marked member");
            stats.skipped_groups += 1;
            continue;
        }

        for path in &group.unmarked {
            write!(out, "{}", path.display())?;
            stats.actions += 1;

            if !dry_run {
                if let Err(error) = std::fs::remove_file(path) {
                    write!(out, ": {error}")?;
                    stats.failures += 1;
                }
            }
            writeln!(out)?;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_report(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("report.txt");
        fs::write(&path, body).unwrap();
        path
    }

    fn file(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "duplicate content").unwrap();
        path
    }

    #[test]
    fn test_deletes_unmarked_keeps_marked() {
        let dir = TempDir::new().unwrap();
        let keep = file(&dir, "keep.txt");
        let drop1 = file(&dir, "drop1.txt");
        let drop2 = file(&dir, "drop2.txt");

        let report = write_report(
            &dir,
            &format!(
                "> {}\n  {}\n  {}\n\n",
                keep.display(),
                drop1.display(),
                drop2.display()
            ),
        );

        let mut out = Vec::new();
        let stats = execute_report(&report, false, &mut out).unwrap();

        assert_eq!(stats.actions, 2);
        assert!(stats.all_succeeded());
        assert!(keep.exists());
        assert!(!drop1.exists());
        assert!(!drop2.exists());
    }

    #[test]
    fn test_unmarked_group_left_alone() {
        let dir = TempDir::new().unwrap();
        let a = file(&dir, "a.txt");
        let b = file(&dir, "b.txt");

        let report = write_report(&dir, &format!("  {}\n  {}\n\n", a.display(), b.display()));

        let mut out = Vec::new();
        let stats = execute_report(&report, false, &mut out).unwrap();

        assert_eq!(stats.actions, 0);
        assert_eq!(stats.skipped_groups, 1);
        assert!(a.exists());
        assert!(b.exists());
    }

    #[test]
    fn test_dry_run_deletes_nothing() {
        let dir = TempDir::new().unwrap();
        let keep = file(&dir, "keep.txt");
        let drop = file(&dir, "drop.txt");

        let report =
            write_report(&dir, &format!("> {}\n  {}\n\n", keep.display(), drop.display()));

        let mut out = Vec::new();
        let stats = execute_report(&report, true, &mut out).unwrap();

        assert_eq!(stats.actions, 1);
        assert!(drop.exists());
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("drop.txt"));
    }

    #[test]
    fn test_missing_target_counts_as_failure() {
        let dir = TempDir::new().unwrap();
        let keep = file(&dir, "keep.txt");
        let ghost = dir.path().join("already-gone.txt");

        let report =
            write_report(&dir, &format!("> {}\n  {}\n\n", keep.display(), ghost.display()));

        let mut out = Vec::new();
        let stats = execute_report(&report, false, &mut out).unwrap();

        assert_eq!(stats.failures, 1);
        assert!(!stats.all_succeeded());
    }

    #[test]
    fn test_malformed_report_aborts_without_deleting() {
        let dir = TempDir::new().unwrap();
        let victim = file(&dir, "victim.txt");

        let report = write_report(
            &dir,
            &format!("> {}\n  {}\n*bad line\n\n", victim.display(), victim.display()),
        );

        let mut out = Vec::new();
        assert!(execute_report(&report, false, &mut out).is_err());
        assert!(victim.exists());
    }

    #[test]
    fn test_ambiguous_marks_preserved() {
        // A '?' mark still counts as marked: the group has a chosen side.
        let dir = TempDir::new().unwrap();
        let a = file(&dir, "a.txt");
        let b = file(&dir, "b.txt");
        let c = file(&dir, "c.txt");

        let report = write_report(
            &dir,
            &format!(
                "? {}\n? {}\n  {}\n\n",
                a.display(),
                b.display(),
                c.display()
            ),
        );

        let mut out = Vec::new();
        let stats = execute_report(&report, false, &mut out).unwrap();

        assert_eq!(stats.actions, 1);
        assert!(a.exists());
        assert!(b.exists());
        assert!(!c.exists());
    }
}
