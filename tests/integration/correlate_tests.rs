//! End-to-end correlate scenarios.

use std::fs;
use std::path::Path;

use bytedupe::correlate::{correlate, CorrelateOptions};
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn run(left: &Path, right: &Path) -> String {
    let options = CorrelateOptions::new(left.to_path_buf(), right.to_path_buf());
    let mut out = Vec::new();
    correlate(&options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_snapshot_diff() {
    let before = tree(&[
        ("docs/readme.md", "unchanged document"),
        ("src/kept.rs", "fn main() {}"),
        ("src/dropped.rs", "obsolete code here"),
    ]);
    let after = tree(&[
        ("docs/readme.md", "unchanged document"),
        ("src/kept.rs", "fn main() {}"),
        ("src/added.rs", "brand new module"),
    ]);

    let report = run(before.path(), after.path());

    let removes: Vec<&str> = report.lines().filter(|l| l.starts_with("- ")).collect();
    let adds: Vec<&str> = report.lines().filter(|l| l.starts_with("+ ")).collect();
    let matches: Vec<&str> = report.lines().filter(|l| l.starts_with("= ")).collect();

    assert_eq!(removes.len(), 1);
    assert!(removes[0].contains("dropped.rs"));
    assert_eq!(adds.len(), 1);
    assert!(adds[0].contains("added.rs"));
    assert_eq!(matches.len(), 2);

    let summary = report.lines().last().unwrap();
    assert!(summary.contains("Matches: 4 files"));
    assert!(summary.contains("Adds: 1 files"));
    assert!(summary.contains("Removes: 1 files"));
}

#[test]
fn test_moved_file_is_a_match() {
    let before = tree(&[("old/location/data.bin", "movable payload")]);
    let after = tree(&[("new/home/renamed.bin", "movable payload")]);

    let report = run(before.path(), after.path());

    assert!(report.lines().any(|l| l.starts_with("= ")));
    assert!(!report.lines().any(|l| l.starts_with("- ")));
    assert!(!report.lines().any(|l| l.starts_with("+ ")));
}

#[test]
fn test_match_block_lists_left_paths_first() {
    let before = tree(&[("from.txt", "shared")]);
    let after = tree(&[("to.txt", "shared")]);

    let report = run(before.path(), after.path());

    let block: Vec<&str> = report
        .lines()
        .take_while(|l| !l.is_empty())
        .collect();
    assert_eq!(block.len(), 2);
    assert!(block[0].starts_with("= "));
    assert!(block[0].contains("from.txt"));
    assert!(block[1].starts_with("  "));
    assert!(block[1].contains("to.txt"));
}

#[test]
fn test_correlate_is_deterministic() {
    let before = tree(&[
        ("a.bin", "one"),
        ("b.bin", "two"),
        ("c.bin", "three"),
    ]);
    let after = tree(&[
        ("a.bin", "one"),
        ("d.bin", "four!"),
    ]);

    let first = run(before.path(), after.path());
    let second = run(before.path(), after.path());
    assert_eq!(first, second);
}

#[test]
fn test_disabled_summary_and_sections() {
    let before = tree(&[("x", "common"), ("gone", "left only!")]);
    let after = tree(&[("x", "common")]);

    let mut options = CorrelateOptions::new(before.path().to_path_buf(), after.path().to_path_buf());
    options.show_matches = false;
    options.show_adds = false;
    options.summary = false;

    let mut out = Vec::new();
    correlate(&options, &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert!(report.lines().all(|l| !l.starts_with("= ")));
    assert!(report.lines().all(|l| !l.starts_with("# ")));
    assert!(report.lines().any(|l| l.starts_with("- ")));
}
