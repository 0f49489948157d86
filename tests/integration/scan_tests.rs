//! End-to-end scan scenarios through the public `find::scan` API.

use std::fs;
use std::path::{Path, PathBuf};

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

fn run_scan(options: &FindOptions) -> String {
    let mut out = Vec::new();
    scan(options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn recursive_options(roots: &[&Path]) -> FindOptions {
    FindOptions {
        paths: roots.iter().map(|p| p.to_path_buf()).collect(),
        recurse: true,
        ..Default::default()
    }
}

fn prefer(options: FindOptions, criteria: &str) -> FindOptions {
    FindOptions {
        criteria: Some(Criteria::parse(criteria).unwrap()),
        ..options
    }
}

#[test]
fn test_identical_pair_reported_unmarked() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0x5Au8; 10240];
    write_file(dir.path(), "a/x", &contents);
    write_file(dir.path(), "b/x", &contents);

    let report = run_scan(&recursive_options(&[dir.path()]));

    assert!(report.contains("## Size: 10K Instances: 2 Excess: 10K Names: 2"));
    let path_lines: Vec<&str> = report
        .lines()
        .filter(|l| !l.starts_with('#') && !l.is_empty())
        .collect();
    assert_eq!(path_lines.len(), 2);
    for line in path_lines {
        assert!(line.starts_with("  "), "no criteria, no marks: {line:?}");
    }
}

#[test]
fn test_prefer_marks_shortest_path() {
    let shallow = TempDir::new().unwrap();
    let deep = TempDir::new().unwrap();
    let contents = b"same bytes everywhere";
    write_file(shallow.path(), "x", contents);
    write_file(deep.path(), "nested/further/x", contents);

    let options = prefer(
        recursive_options(&[shallow.path(), deep.path()]),
        "shorter path",
    );
    let report = run_scan(&options);

    let marked: Vec<&str> = report.lines().filter(|l| l.starts_with("> ")).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].ends_with("x"));
    assert!(marked[0].contains(shallow.path().to_str().unwrap()));
}

#[test]
fn test_prefer_picks_the_uncluttered_copy() {
    let dir = TempDir::new().unwrap();
    let photo = vec![0xEEu8; 2048];
    write_file(dir.path(), "photo.jpg", &photo);
    write_file(dir.path(), "backup/photo.jpg", &photo);
    write_file(dir.path(), "Copy of photo.jpg", &photo);

    let options = prefer(recursive_options(&[dir.path()]), "shorter path");
    let report = run_scan(&options);

    let marked: Vec<&str> = report.lines().filter(|l| l.starts_with("> ")).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].ends_with("/photo.jpg"));
    assert!(!marked[0].contains("backup"));
    assert!(!marked[0].contains("Copy"));
}

#[test]
fn test_prefer_tie_marks_both_ambiguous() {
    let dir = TempDir::new().unwrap();
    let photo = vec![0xEEu8; 2048];
    write_file(dir.path(), "photo1.jpg", &photo);
    write_file(dir.path(), "photo2.jpg", &photo);
    write_file(dir.path(), "backup/photo.jpg", &photo);
    write_file(dir.path(), "deeper/still/photo.jpg", &photo);

    let options = prefer(recursive_options(&[dir.path()]), "shorter path");
    let report = run_scan(&options);

    let ambiguous: Vec<&str> = report.lines().filter(|l| l.starts_with("? ")).collect();
    assert_eq!(ambiguous.len(), 2);
    assert!(ambiguous.iter().any(|l| l.ends_with("photo1.jpg")));
    assert!(ambiguous.iter().any(|l| l.ends_with("photo2.jpg")));
    assert!(report.lines().all(|l| !l.starts_with("> ")));
}

#[test]
fn test_prefer_tiebreaker_restores_single_mark() {
    let dir = TempDir::new().unwrap();
    let photo = vec![0xEEu8; 2048];
    write_file(dir.path(), "photo1.jpg", &photo);
    write_file(dir.path(), "photo2.jpg", &photo);
    write_file(dir.path(), "backup/photo.jpg", &photo);

    let options = prefer(
        recursive_options(&[dir.path()]),
        "shorter path, earlier path",
    );
    let report = run_scan(&options);

    let marked: Vec<&str> = report.lines().filter(|l| l.starts_with("> ")).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].ends_with("photo1.jpg"));
    // The loser of the tiebreak reverts to unmarked.
    assert!(report
        .lines()
        .any(|l| l.starts_with("  ") && l.ends_with("photo2.jpg")));
}

#[test]
fn test_prefer_earlier_mtime_marks_the_oldest_copy() {
    let dir = TempDir::new().unwrap();
    let contents = vec![0xB7u8; 1024];
    let old = write_file(dir.path(), "old.dat", &contents);
    let new = write_file(dir.path(), "new.dat", &contents);

    filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000_000_000, 0)).unwrap();
    filetime::set_file_mtime(&new, filetime::FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let options = prefer(recursive_options(&[dir.path()]), "earlier mtime");
    let report = run_scan(&options);

    let marked: Vec<&str> = report.lines().filter(|l| l.starts_with("> ")).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].ends_with("old.dat"));

    let options = prefer(
        recursive_options(&[dir.path()]),
        "later modification time",
    );
    let report = run_scan(&options);

    let marked: Vec<&str> = report.lines().filter(|l| l.starts_with("> ")).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].ends_with("new.dat"));
}

#[test]
fn test_tight_memory_budget_still_partitions_exactly() {
    let dir = TempDir::new().unwrap();
    let size = 1024 * 1024usize;
    let same = vec![0xA5u8; size];
    let mut divergent = same.clone();
    divergent[0] = 0;
    write_file(dir.path(), "one.bin", &same);
    write_file(dir.path(), "two.bin", &divergent);
    write_file(dir.path(), "three.bin", &same);

    let options = FindOptions {
        max_memory: 64 * 1024,
        max_buffer: 8 * 1024,
        ..recursive_options(&[dir.path()])
    };
    let report = run_scan(&options);

    assert!(report.contains("## Size: 1M Instances: 2 Excess: 1M Names: 2"));
    assert!(report.contains("one.bin"));
    assert!(report.contains("three.bin"));
    assert!(!report.contains("two.bin"));
}

#[test]
fn test_groups_emitted_largest_first() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "small1", &[1u8; 100]);
    write_file(dir.path(), "small2", &[1u8; 100]);
    write_file(dir.path(), "big1", &[2u8; 5000]);
    write_file(dir.path(), "big2", &[2u8; 5000]);

    let report = run_scan(&recursive_options(&[dir.path()]));

    let big = report.find("big1").unwrap();
    let small = report.find("small1").unwrap();
    assert!(big < small, "larger groups come first");
}

#[test]
fn test_different_content_same_size_not_grouped() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a", b"aaaa");
    write_file(dir.path(), "b", b"bbbb");

    let report = run_scan(&recursive_options(&[dir.path()]));
    assert!(report.is_empty());
}

#[test]
fn test_zero_length_files_need_the_zero_flag() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "empty1", b"");
    write_file(dir.path(), "empty2", b"");

    let report = run_scan(&recursive_options(&[dir.path()]));
    assert!(report.is_empty());

    let options = FindOptions {
        min_size: 0,
        ..recursive_options(&[dir.path()])
    };
    let report = run_scan(&options);
    assert!(report.contains("Instances: 2"));
    assert!(report.contains("empty1"));
}

#[test]
fn test_exclude_by_basename() {
    let dir = TempDir::new().unwrap();
    let contents = vec![3u8; 512];
    write_file(dir.path(), "wanted1.dat", &contents);
    write_file(dir.path(), "wanted2.dat", &contents);
    write_file(dir.path(), "Thumbs.db", &contents);

    let options = FindOptions {
        exclude_names: vec!["Thumbs.db".to_string()],
        ..recursive_options(&[dir.path()])
    };
    let report = run_scan(&options);

    assert!(report.contains("wanted1.dat"));
    assert!(!report.contains("Thumbs.db"));
}

#[test]
fn test_only_mixed_roots_drops_single_root_groups() {
    let left = TempDir::new().unwrap();
    let right = TempDir::new().unwrap();
    let within = vec![7u8; 256];
    let across = vec![8u8; 512];
    // Duplicates entirely inside the left root...
    write_file(left.path(), "inside1", &within);
    write_file(left.path(), "inside2", &within);
    // ...and a pair spanning both roots.
    write_file(left.path(), "span", &across);
    write_file(right.path(), "span", &across);

    let options = FindOptions {
        only_mixed_roots: true,
        ..recursive_options(&[left.path(), right.path()])
    };
    let report = run_scan(&options);

    assert!(report.contains("span"));
    assert!(!report.contains("inside1"));
}

#[test]
#[cfg(unix)]
fn test_hardlinks_without_alias_detection_are_plain_duplicates() {
    let dir = TempDir::new().unwrap();
    let original = write_file(dir.path(), "original", &[9u8; 1024]);
    fs::hard_link(&original, dir.path().join("linked")).unwrap();

    let report = run_scan(&recursive_options(&[dir.path()]));

    assert!(report.contains("Instances: 2"));
    assert!(report.contains("original"));
    assert!(report.contains("linked"));
}

#[test]
#[cfg(unix)]
fn test_alias_detection_folds_hardlinks() {
    let dir = TempDir::new().unwrap();
    let original = write_file(dir.path(), "original", &[9u8; 1024]);
    fs::hard_link(&original, dir.path().join("linked")).unwrap();

    let options = FindOptions {
        detect_aliases: true,
        ..recursive_options(&[dir.path()])
    };
    let report = run_scan(&options);

    // One content, two names: no byte comparison was needed, but the
    // group is still reported with both paths.
    assert!(report.contains("Instances: 1"));
    assert!(report.contains("Names: 2"));
    assert!(report.contains("original"));
    assert!(report.contains("linked"));
}

#[test]
fn test_scan_summary_counts() {
    let dir = TempDir::new().unwrap();
    let contents = vec![4u8; 300];
    write_file(dir.path(), "dup1", &contents);
    write_file(dir.path(), "dup2", &contents);
    write_file(dir.path(), "unique", &[5u8; 400]);

    let mut out = Vec::new();
    let summary = scan(&recursive_options(&[dir.path()]), &mut out).unwrap();

    assert_eq!(summary.files_seen, 3);
    assert_eq!(summary.groups_written, 1);
    assert_eq!(summary.errors, 0);
}

#[test]
fn test_elapsed_time_trailer() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a", &[1u8; 64]);
    write_file(dir.path(), "b", &[1u8; 64]);

    let options = FindOptions {
        log_time: true,
        ..recursive_options(&[dir.path()])
    };
    let report = run_scan(&options);

    assert!(report.lines().last().unwrap().starts_with("# Elapsed time: "));
}

#[test]
fn test_scan_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let contents = vec![6u8; 777];
    for name in ["q/dup", "p/dup", "r/dup", "z/other", "y/other"] {
        write_file(dir.path(), name, &contents);
    }

    let first = run_scan(&recursive_options(&[dir.path()]));
    let second = run_scan(&recursive_options(&[dir.path()]));
    assert_eq!(first, second);
}
