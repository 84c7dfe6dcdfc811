#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// No run files were found or none could be read.
    NoRuns = 10,

    /// Invalid CLI/config/options (bad flags, invalid durations, malformed config or report file).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors while writing output, failed background tasks).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_run_count(runs: usize) -> Self {
        if runs == 0 {
            Self::NoRuns
        } else {
            Self::Success
        }
    }
}
