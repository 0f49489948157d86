//! Progress reporting using indicatif.
//!
//! Two phases report progress: file enumeration (a spinner showing the last
//! path seen, updated every [`WALK_UPDATE_FREQUENCY`] files) and content
//! comparison (a byte-granular bar per size group). Both are optional; the
//! engine talks to a [`CompareProgress`] trait so that quiet runs pay
//! nothing.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

/// Update the enumeration spinner after this many additional files.
pub const WALK_UPDATE_FREQUENCY: u64 = 2000;

/// Receiver for comparison progress within one size group.
pub trait CompareProgress {
    /// Report the current offset of the comparison within files of `total`
    /// bytes. Throttled by the caller.
    fn update(&self, offset: u64, total: u64);

    /// Remove any visible progress display before other output is printed.
    fn clear(&self);
}

/// Progress sink that does nothing.
pub struct NoProgress;

impl CompareProgress for NoProgress {
    fn update(&self, _offset: u64, _total: u64) {}
    fn clear(&self) {}
}

/// Terminal progress bar for one size group's comparison.
pub struct CompareBar {
    bar: ProgressBar,
}

impl CompareBar {
    /// Create a bar spanning `total` bytes.
    #[must_use]
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("comparing {bytes}/{total_bytes} [{bar:32}] {bytes_per_sec}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl CompareProgress for CompareBar {
    fn update(&self, offset: u64, _total: u64) {
        self.bar.set_position(offset);
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner shown while enumerating the filesystem.
pub struct WalkProgress {
    spinner: Option<ProgressBar>,
    files: u64,
    last_update: u64,
}

impl WalkProgress {
    /// Create the spinner; a disabled instance costs nothing per file.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let spinner = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {pos} files {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        });
        Self {
            spinner,
            files: 0,
            last_update: 0,
        }
    }

    /// Count one enumerated file, refreshing the display periodically.
    pub fn tick(&mut self, path: &Path) {
        self.files += 1;
        if let Some(spinner) = &self.spinner {
            if self.files - self.last_update >= WALK_UPDATE_FREQUENCY || self.last_update == 0 {
                self.last_update = self.files;
                spinner.set_position(self.files);
                spinner.set_message(path.display().to_string());
            }
        }
    }

    /// Number of files counted so far.
    #[must_use]
    pub fn files_seen(&self) -> u64 {
        self.files
    }

    /// Tear the spinner down.
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
