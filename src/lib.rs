//! bytedupe - find files with identical content.
//!
//! Duplicate detection works by exact byte comparison rather than content
//! hashing: files of equal size are partitioned into equivalence classes by
//! reading them in lockstep under a configurable memory budget. A small
//! criteria language (`--prefer`) selects one member of each duplicate group
//! for preservation, and generated reports can be fed back to delete the
//! remaining copies or replace them with hard links. A second mode compares
//! two directory trees by content.

pub mod actions;
pub mod cli;
pub mod correlate;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod find;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod units;
