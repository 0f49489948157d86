//! Full pipeline: scan to a report, then execute or coalesce it.

use std::fs;
use std::path::{Path, PathBuf};

use bytedupe::actions::{coalesce_report, execute_report};
use bytedupe::criteria::Criteria;
use bytedupe::find::{scan, FindOptions};
use tempfile::TempDir;

fn write_file(root: &Path, relative: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Scan `root` with the given criteria and save the report in its own
/// directory. The returned guard keeps the report alive.
fn scan_to_report(root: &Path, criteria: &str) -> (TempDir, PathBuf) {
    let options = FindOptions {
        paths: vec![root.to_path_buf()],
        recurse: true,
        criteria: Some(Criteria::parse(criteria).unwrap()),
        ..Default::default()
    };
    let mut out = Vec::new();
    scan(&options, &mut out).unwrap();

    let report_dir = TempDir::new().unwrap();
    let report_path = report_dir.path().join("report.txt");
    fs::write(&report_path, out).unwrap();
    (report_dir, report_path)
}

#[test]
fn test_scan_then_execute_deletes_unpreferred() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0xC3u8; 4096];
    let keeper = write_file(dir.path(), "keep.dat", &contents);
    let backup = write_file(dir.path(), "backup/keep.dat", &contents);
    let copy = write_file(dir.path(), "copies/extra/keep.dat", &contents);
    let unrelated = write_file(dir.path(), "unrelated.dat", &[0x11u8; 100]);

    let (_report_dir, report) = scan_to_report(dir.path(), "shorter path");

    let mut out = Vec::new();
    let stats = execute_report(&report, false, &mut out).unwrap();

    assert_eq!(stats.actions, 2);
    assert!(stats.all_succeeded());
    assert!(keeper.exists());
    assert!(!backup.exists());
    assert!(!copy.exists());
    assert!(unrelated.exists());
}

#[test]
fn test_dry_run_then_execute() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0x42u8; 1000];
    let keeper = write_file(dir.path(), "a.dat", &contents);
    let dupe = write_file(dir.path(), "sub/a.dat", &contents);

    let (_report_dir, report) = scan_to_report(dir.path(), "shorter path");

    // Dry run: everything survives, the plan is listed.
    let mut out = Vec::new();
    let stats = execute_report(&report, true, &mut out).unwrap();
    assert_eq!(stats.actions, 1);
    assert!(dupe.exists());
    assert!(String::from_utf8(out).unwrap().contains("a.dat"));

    // The real thing.
    let mut out = Vec::new();
    execute_report(&report, false, &mut out).unwrap();
    assert!(keeper.exists());
    assert!(!dupe.exists());
}

#[test]
fn test_report_without_marks_deletes_nothing() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0x42u8; 1000];
    let a = write_file(dir.path(), "a.dat", &contents);
    let b = write_file(dir.path(), "b.dat", &contents);

    // No criteria: the report has no marked paths at all.
    let options = FindOptions {
        paths: vec![dir.path().to_path_buf()],
        recurse: true,
        ..Default::default()
    };
    let mut out = Vec::new();
    scan(&options, &mut out).unwrap();
    let report = dir.path().join("report.txt");
    fs::write(&report, out).unwrap();

    let mut out = Vec::new();
    let stats = execute_report(&report, false, &mut out).unwrap();

    assert_eq!(stats.actions, 0);
    assert_eq!(stats.skipped_groups, 1);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
#[cfg(unix)]
fn test_scan_then_coalesce_hardlinks_duplicates() {
    use std::os::unix::fs::MetadataExt;

    let dir = TempDir::new().unwrap();
    let contents = vec![0x99u8; 2048];
    let keeper = write_file(dir.path(), "keep.dat", &contents);
    let dupe = write_file(dir.path(), "mirror/keep.dat", &contents);

    let (_report_dir, report) = scan_to_report(dir.path(), "shorter path");

    let mut out = Vec::new();
    let stats = coalesce_report(&report, false, &mut out).unwrap();

    assert_eq!(stats.actions, 1);
    assert!(stats.all_succeeded());
    assert_eq!(
        fs::metadata(&keeper).unwrap().ino(),
        fs::metadata(&dupe).unwrap().ino()
    );
    assert_eq!(fs::read(&dupe).unwrap(), contents);
}

#[test]
#[cfg(unix)]
fn test_coalesced_tree_scans_clean_with_alias_detection() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0x77u8; 512];
    write_file(dir.path(), "one.dat", &contents);
    write_file(dir.path(), "two.dat", &contents);

    let (_report_dir, report) = scan_to_report(dir.path(), "earlier name");
    let mut out = Vec::new();
    coalesce_report(&report, false, &mut out).unwrap();

    // After coalescing, alias detection sees one content with two names
    // and performs no byte comparison; without it the pair still reports
    // as duplicates.
    let options = FindOptions {
        paths: vec![dir.path().to_path_buf()],
        recurse: true,
        detect_aliases: true,
        ..Default::default()
    };
    let mut out = Vec::new();
    scan(&options, &mut out).unwrap();
    let aliased = String::from_utf8(out).unwrap();
    assert!(aliased.contains("Instances: 1"));
    assert!(aliased.contains("Names: 2"));
}

#[test]
fn test_execute_rejects_corrupt_report() {
    let dir = TempDir::new().unwrap();
    let victim = write_file(dir.path(), "victim.dat", b"precious");
    let report = dir.path().join("report.txt");
    fs::write(
        &report,
        format!("> {}\nBROKEN LINE\n  {}\n", victim.display(), victim.display()),
    )
    .unwrap();

    let mut out = Vec::new();
    assert!(execute_report(&report, false, &mut out).is_err());
    assert!(victim.exists());
}
