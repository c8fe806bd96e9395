//! Metadata tracking for index persistence.
//!
//! The binary index alone reproduces search results, but it cannot tell
//! which model or corpus it was built from. This sidecar records both so
//! startup can refuse a drifted combination instead of serving wrong rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{RecommendError, RecommendResult};
use crate::vector::Metric;

/// File name of the sidecar inside the index directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Metadata written next to `index.bin`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Name of the embedding model used
    pub model_name: String,

    /// Dimension of embeddings
    pub dimension: usize,

    /// Number of corpus records (= index rows)
    pub record_count: usize,

    /// Metric stored in the index header
    pub metric: Metric,

    /// `Corpus::digest` of the corpus the index was built from
    pub corpus_digest: String,

    /// When the index was built
    pub created_at: DateTime<Utc>,

    /// Version of the metadata format
    pub version: u32,
}

impl IndexMetadata {
    /// Current metadata version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create new metadata stamped with the current time
    pub fn new(
        model_name: impl Into<String>,
        dimension: usize,
        record_count: usize,
        metric: Metric,
        corpus_digest: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
            record_count,
            metric,
            corpus_digest: corpus_digest.into(),
            created_at: Utc::now(),
            version: Self::CURRENT_VERSION,
        }
    }

    /// Save metadata to `path` atomically
    pub fn save(&self, path: &Path) -> RecommendResult<()> {
        let persist_err = |reason: String| RecommendError::PersistFailure {
            artifact: "index metadata",
            path: path.to_path_buf(),
            reason,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| persist_err(e.to_string()))?;
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| persist_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| persist_err(e.to_string()))?;
        tmp.persist(path)
            .map_err(|e| persist_err(e.error.to_string()))?;
        Ok(())
    }

    /// Load metadata from a JSON file
    pub fn load(path: &Path) -> RecommendResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| RecommendError::load("index metadata", path, e))?;
        let metadata: Self = serde_json::from_str(&json)
            .map_err(|e| RecommendError::load("index metadata", path, e))?;

        if metadata.version > Self::CURRENT_VERSION {
            return Err(RecommendError::load(
                "index metadata",
                path,
                format!(
                    "metadata version {} is newer than supported version {}",
                    metadata.version,
                    Self::CURRENT_VERSION
                ),
            ));
        }

        Ok(metadata)
    }
}
