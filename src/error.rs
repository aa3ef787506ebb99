//! Unified error types for mathce1 with fail-open philosophy.
//!
//! Nothing in the exercise engine is fatal. Storage problems, corrupt blobs
//! and bad configuration all degrade to safe defaults: we log a warning and
//! carry on, because a child staring at a crash screen is worse than a
//! progression record that starts over.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mathce1 operations.
#[derive(Error, Debug)]
pub enum MathError {
    /// I/O errors from the key-value store.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML (de)serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Caller handed us something we cannot use (bad profile name, full roster).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A domain name that matches none of the five domains.
    #[error("unknown domain: {name}")]
    UnknownDomain { name: String },

    /// An engine operation that needs a running session.
    #[error("no active session")]
    NoActiveSession,
}

/// A specialized Result type for mathce1 operations.
pub type Result<T> = std::result::Result<T, MathError>;

impl MathError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an unknown domain error.
    pub fn unknown_domain(name: impl Into<String>) -> Self {
        Self::UnknownDomain { name: name.into() }
    }
}

impl From<io::Error> for MathError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for MathError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and hand back a safe default instead of propagating.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the mathce1 CLI.
pub mod exit_codes {
    /// The command did what was asked.
    pub const SUCCESS: i32 = 0;

    /// The command ran but reported a failure.
    pub const ERROR: i32 = 1;

    /// Panic; details go to `crash.log`.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = MathError::storage(
            "/tmp/progressions.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/progressions.json"));
    }

    #[test]
    fn test_unknown_domain_display() {
        let err = MathError::unknown_domain("astronomie");
        assert_eq!(err.to_string(), "unknown domain: astronomie");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = MathError::invalid_input("name too long");
        assert_eq!(err.to_string(), "invalid input: name too long");
    }

    #[test]
    fn test_no_active_session_display() {
        assert_eq!(MathError::NoActiveSession.to_string(), "no active session");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: MathError = io_err.into();
        assert!(matches!(err, MathError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: MathError = json_err.into();
        assert!(matches!(err, MathError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(MathError::serde("corrupt blob"));
        assert!(result.fail_open_default("reading sessions").is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<u32> = Err(MathError::config("bad"));
        assert_eq!(result.fail_open_with("loading level", 1), 1);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<u32> = Ok(7);
        assert_eq!(result.fail_open_default("ok path"), 7);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }
}
