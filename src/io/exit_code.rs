//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success (fewer results than requested is still success)
//! - `1`: General error
//! - `2`: Blocking error, the index and corpus or model disagree
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::RecommendError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Artifacts are out of alignment; rebuild before retrying (code 2)
    BlockingError = 2,

    /// Bad argument such as `k = 0` (code 3)
    InvalidArgument = 3,

    /// Model failed to encode the text (code 4)
    VectorizationError = 4,

    /// Model, index, or corpus could not be read or written (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Time budget exhausted (code 7)
    Timeout = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Convert a `RecommendError` to the appropriate exit code.
    pub fn from_error(error: &RecommendError) -> Self {
        match error {
            RecommendError::DimensionMismatch { .. }
            | RecommendError::IndexCorpusMismatch { .. }
            | RecommendError::RowCountMismatch { .. } => ExitCode::BlockingError,
            RecommendError::InvalidArgument { .. } => ExitCode::InvalidArgument,
            RecommendError::VectorizationFailure { .. } => ExitCode::VectorizationError,
            RecommendError::ResourceLoadFailure { .. } | RecommendError::PersistFailure { .. } => {
                ExitCode::IoError
            }
            RecommendError::ConfigError { .. } => ExitCode::ConfigError,
            RecommendError::Timeout { .. } => ExitCode::Timeout,
            RecommendError::Internal { .. } => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - rebuild the index",
            ExitCode::InvalidArgument => "Invalid argument",
            ExitCode::VectorizationError => "Vectorization error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::Timeout => "Timed out",
        }
    }
}
