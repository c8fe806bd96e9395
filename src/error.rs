//! Error types for the assessment search engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for building, loading, and querying the engine
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The model is unavailable or the text could not be encoded
    #[error("Vectorization failed: {reason}")]
    VectorizationFailure { reason: String },

    /// Query width differs from the index width
    #[error(
        "Dimension mismatch: index has {expected} dimensions, query has {actual}. The index was built with a different embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    /// Caller supplied an unusable argument (e.g. k = 0)
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A resolved position falls outside the corpus
    #[error(
        "Index position {position} is outside the corpus of {corpus_len} records. The index and corpus were built from different corpus versions"
    )]
    IndexCorpusMismatch { position: usize, corpus_len: usize },

    /// Index row count differs from the corpus record count
    #[error(
        "Index has {index_rows} rows but the corpus has {corpus_len} records. The index and corpus were built from different corpus versions"
    )]
    RowCountMismatch { index_rows: usize, corpus_len: usize },

    /// Startup could not load the model, index, or corpus
    #[error("Failed to load {resource} from '{path}': {reason}")]
    ResourceLoadFailure {
        resource: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Offline build could not persist its artifacts
    #[error("Failed to persist {artifact} to '{path}': {reason}")]
    PersistFailure {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// The caller's time budget ran out before the recommendation finished
    #[error("Recommendation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Configuration could not be read
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// The query task panicked or was cancelled
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl RecommendError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::VectorizationFailure { .. } => "VECTORIZATION_FAILED",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::IndexCorpusMismatch { .. } | Self::RowCountMismatch { .. } => {
                "INDEX_CORPUS_MISMATCH"
            }
            Self::ResourceLoadFailure { .. } => "RESOURCE_LOAD_FAILED",
            Self::PersistFailure { .. } => "PERSIST_FAILED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// True for errors raised while serving a single query.
    ///
    /// These never take the service down; everything else is a startup or
    /// build failure.
    pub fn is_per_query(&self) -> bool {
        matches!(
            self,
            Self::VectorizationFailure { .. }
                | Self::DimensionMismatch { .. }
                | Self::InvalidArgument { .. }
                | Self::IndexCorpusMismatch { .. }
                | Self::Timeout { .. }
                | Self::Internal { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DimensionMismatch { .. } => vec![
                "Rebuild the index with 'assess-index build' using the configured model",
                "Or set embedding.model back to the model the index was built with",
            ],
            Self::IndexCorpusMismatch { .. } | Self::RowCountMismatch { .. } => vec![
                "Rebuild the index from the corpus file the service loads",
                "Deploy index.bin, metadata.json and the corpus together",
            ],
            Self::ResourceLoadFailure { .. } => vec![
                "Run 'assess-index build' to create the index",
                "Check corpus_path and index_dir in .assess/settings.toml",
            ],
            Self::VectorizationFailure { .. } => vec![
                "Check that the embedding model finished downloading",
                "Retry the request; the model state is unaffected",
            ],
            Self::InvalidArgument { .. } => vec!["Request at least one result"],
            Self::Timeout { .. } => vec!["Increase search.timeout_ms or retry the request"],
            Self::PersistFailure { .. } => vec!["Check disk space and permissions for index_dir"],
            Self::ConfigError { .. } => vec!["Run 'assess init --force' to regenerate settings"],
            Self::Internal { .. } => vec![
                "Retry the request",
                "Run with --verbose and report the logged failure",
            ],
        }
    }

    /// Wrap a vector-layer error raised while serving a query.
    pub fn from_query(error: VectorError) -> Self {
        match error {
            VectorError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            VectorError::InvalidArgument(reason) => Self::InvalidArgument { reason },
            other => Self::VectorizationFailure {
                reason: other.to_string(),
            },
        }
    }

    /// Wrap an error raised while loading a startup resource.
    pub fn load(resource: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ResourceLoadFailure {
            resource,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for engine operations
pub type RecommendResult<T> = Result<T, RecommendError>;
