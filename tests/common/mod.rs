#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use assessment_search::vector::{VectorDimension, VectorError};
use assessment_search::{Corpus, EmbeddingGenerator, Record, Settings};
use tempfile::TempDir;

/// Deterministic bag-of-words embedder: each non-stop-word is hashed into a
/// bucket, so texts that share vocabulary score higher.
pub struct HashingEmbedder {
    dimension: VectorDimension,
    name: String,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(384)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dimension).expect("valid dimension"),
            name: "hashing-test".to_string(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl EmbeddingGenerator for HashingEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        const STOP_WORDS: &[&str] = &["a", "an", "and", "the", "of", "for", "to", "with"];
        let dim = self.dimension.get();

        Ok(texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.0; dim];
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .map(str::to_lowercase)
                    .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
                {
                    let bucket = word.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
                    });
                    embedding[(bucket % dim as u64) as usize] += 1.0;
                }
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// The three-record catalog used throughout the retrieval scenarios.
pub fn sample_records() -> Vec<Record> {
    let mut numerical = Record::new(
        "Verify Numerical Reasoning",
        "https://example.com/numerical",
        "fast numeric reasoning test",
    );
    numerical.remote_testing = true;
    numerical.duration_minutes = Some(18);
    numerical.test_types_full = vec!["Ability & Aptitude".to_string()];

    let mut personality = Record::new(
        "OPQ32r",
        "https://example.com/opq",
        "personality and behavior questionnaire",
    );
    personality.adaptive_supported = true;
    personality.test_types_full = vec!["Personality & Behavior".to_string()];

    let coding = Record::new(
        "Coding Simulation",
        "https://example.com/coding",
        "coding skills simulation",
    );

    vec![numerical, personality, coding]
}

pub fn sample_corpus() -> Corpus {
    Corpus::from_records(sample_records())
}

pub fn embedder() -> Arc<HashingEmbedder> {
    Arc::new(HashingEmbedder::new())
}

/// Isolated workspace with a corpus written to disk.
pub struct TestWorkspace {
    pub dir: TempDir,
    pub settings: Settings,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::with_records(sample_records())
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let mut settings = Settings::default();
        settings.corpus_path = dir.path().join("corpus.json");
        settings.index_dir = dir.path().join("index");

        let workspace = Self { dir, settings };
        workspace.write_corpus(&records);
        workspace
    }

    pub fn write_corpus(&self, records: &[Record]) -> PathBuf {
        let json = serde_json::to_string_pretty(records).expect("serialize corpus");
        std::fs::write(&self.settings.corpus_path, json).expect("Failed to write corpus");
        self.settings.corpus_path.clone()
    }

    pub fn corpus(&self) -> Corpus {
        Corpus::load(&self.settings.corpus_path).expect("load corpus")
    }
}
