//! Exit codes for the lt-core CLI.
//!
//! Exit codes communicate the run outcome without requiring output parsing.

use lt_common::Error;

/// Exit codes for lt-core runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Log converted (or printed) to the end
    Clean = 0,

    /// Bad options, config file, or type catalog
    ConfigError = 10,

    /// Event log unreadable or malformed
    LogError = 11,

    /// Schema error that aborted the run
    EngineError = 12,

    /// I/O error while writing outputs
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Map a run error to its exit code by error code group.
    pub fn for_error(err: &Error) -> Self {
        match err.code() {
            10..=19 => ExitCode::ConfigError,
            20..=29 => ExitCode::LogError,
            30..=49 => ExitCode::EngineError,
            60..=69 => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_groups_map_to_exit_codes() {
        assert_eq!(
            ExitCode::for_error(&Error::Config("x".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::for_error(&Error::LogFormat("x".into())),
            ExitCode::LogError
        );
        assert_eq!(
            ExitCode::for_error(&Error::MissingColumn {
                channel: "c".into(),
                field: "f".into()
            }),
            ExitCode::EngineError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Export("x".into())),
            ExitCode::IoError
        );
    }

    #[test]
    fn only_clean_is_success() {
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::EngineError.is_success());
        assert_eq!(i32::from(ExitCode::IoError), 13);
    }
}
