//! Catalog records and the ordered corpus the index is built over.
//!
//! A record's position in the corpus is its identity for retrieval: row `i`
//! of the embedding matrix belongs to `corpus[i]`. The corpus is loaded once
//! and never reordered or filtered afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{RecommendError, RecommendResult};

/// One catalog item as produced by the data-preparation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub url: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub remote_testing: bool,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub adaptive_supported: bool,

    #[serde(default)]
    pub duration_minutes: Option<u32>,

    #[serde(default)]
    pub test_types_full: Vec<String>,

    #[serde(default)]
    pub job_levels: String,

    #[serde(default)]
    pub languages: String,

    /// Designated text field the embedding is built from
    #[serde(default)]
    pub embedding_text: String,

    /// Display fields this crate does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    /// Minimal record for callers that only care about title and text.
    pub fn new(title: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
            remote_testing: false,
            adaptive_supported: false,
            duration_minutes: None,
            test_types_full: Vec::new(),
            job_levels: String::new(),
            languages: String::new(),
            embedding_text: text.into(),
            extra: BTreeMap::new(),
        }
    }

    /// The text this record is embedded from.
    ///
    /// Uses `embedding_text` when present, otherwise the description followed
    /// by the test type labels.
    pub fn text_for_embedding(&self) -> String {
        let text = self.embedding_text.trim();
        if !text.is_empty() {
            return text.to_string();
        }

        let mut parts = Vec::with_capacity(1 + self.test_types_full.len());
        if !self.description.trim().is_empty() {
            parts.push(self.description.trim());
        }
        parts.extend(
            self.test_types_full
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty()),
        );
        parts.join(" ")
    }
}

/// Accepts `true`/`false` as well as the crawler's "yes"/"no" strings.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Ok(true),
            "no" | "n" | "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected yes/no or a boolean, found '{other}'"
            ))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected yes/no or a boolean, found {other}"
        ))),
    }
}

/// Ordered, immutable sequence of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records.
    pub fn load(path: impl AsRef<Path>) -> RecommendResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RecommendError::load("corpus", path, e))?;
        let records: Vec<Record> =
            serde_json::from_str(&json).map_err(|e| RecommendError::load("corpus", path, e))?;

        tracing::debug!(path = %path.display(), records = records.len(), "corpus loaded");
        Ok(Self { records })
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Embedding texts in corpus order.
    pub fn texts(&self) -> Vec<String> {
        self.records.iter().map(Record::text_for_embedding).collect()
    }

    /// SHA-256 over the ordered embedding texts, hex encoded.
    ///
    /// Two corpora share a digest only if they would produce the same matrix
    /// rows in the same order.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.records.len() as u64).to_le_bytes());
        for text in self.texts() {
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
