use thiserror::Error;

/// Unified error type for cut-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Invalid version '{input}': expected MAJOR.MINOR.PATCH")]
    VersionFormat { input: String },

    #[error("Version {version} is the same as the current version")]
    VersionUnchanged { version: String },

    #[error("Version {candidate} must be greater than the current version {current}")]
    VersionNotGreater { candidate: String, current: String },

    #[error("File error: {0}")]
    File(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{failed} check(s) failed")]
    CheckFailure { failed: usize },

    #[error("Release step '{step}' failed: {reason}")]
    StepFailure { step: String, reason: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in cut-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a usage error with context
    pub fn usage(msg: impl Into<String>) -> Self {
        ReleaseError::Usage(msg.into())
    }

    /// Create a version format error naming the offending input
    pub fn version_format(input: impl Into<String>) -> Self {
        ReleaseError::VersionFormat {
            input: input.into(),
        }
    }

    /// Create a file error with context
    pub fn file(msg: impl Into<String>) -> Self {
        ReleaseError::File(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Process exit status for this error. Each terminal condition has its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Usage(_) => 2,
            ReleaseError::VersionFormat { .. } => 3,
            ReleaseError::VersionUnchanged { .. } | ReleaseError::VersionNotGreater { .. } => 4,
            ReleaseError::File(_) | ReleaseError::Io(_) => 5,
            ReleaseError::Config(_) => 6,
            ReleaseError::CheckFailure { .. } => 7,
            ReleaseError::StepFailure { .. } => 8,
            ReleaseError::Git(_) => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("bad key");
        assert_eq!(err.to_string(), "Configuration error: bad key");
    }

    #[test]
    fn test_version_format_names_input() {
        let err = ReleaseError::version_format("1.2");
        assert!(err.to_string().contains("'1.2'"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_step_failure_message() {
        let err = ReleaseError::StepFailure {
            step: "Push to origin".to_string(),
            reason: "rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Release step 'Push to origin' failed: rejected"
        );
    }

    #[test]
    fn test_exit_codes_are_non_zero_and_distinct_per_kind() {
        let errors = vec![
            ReleaseError::usage("x"),
            ReleaseError::version_format("x"),
            ReleaseError::VersionNotGreater {
                candidate: "0.1.0".to_string(),
                current: "1.0.0".to_string(),
            },
            ReleaseError::file("x"),
            ReleaseError::config("x"),
            ReleaseError::CheckFailure { failed: 1 },
            ReleaseError::StepFailure {
                step: "x".to_string(),
                reason: "y".to_string(),
            },
            ReleaseError::Git(git2::Error::from_str("x")),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_order_errors_share_exit_code() {
        let same = ReleaseError::VersionUnchanged {
            version: "1.0.0".to_string(),
        };
        let lower = ReleaseError::VersionNotGreater {
            candidate: "0.9.0".to_string(),
            current: "1.0.0".to_string(),
        };
        assert_eq!(same.exit_code(), lower.exit_code());
    }
}
