//! Process exit codes.

/// Exit codes for the bytedupe binary.
///
/// - 0: Success (completed normally, whether or not duplicates were found)
/// - 1: General error (bad arguments, criteria parse failure, unreadable
///   report, fatal I/O)
/// - 2: Partial failure (a destructive action failed for some paths; the
///   rest were processed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// Aborted before or during the run.
    GeneralError = 1,
    /// Some destructive actions failed; others were carried out.
    PartialFailure = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
