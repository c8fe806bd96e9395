//! Offline construction of the embedding matrix and the persisted index.
//!
//! The build is all-or-nothing: every record is embedded in corpus order and
//! the matrix is checked against the corpus before anything touches disk.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::Settings;
use crate::corpus::Corpus;
use crate::display::progress::create_progress_bar;
use crate::error::{RecommendError, RecommendResult};
use crate::metadata::IndexMetadata;
use crate::vector::{EmbeddingGenerator, EmbeddingMatrix, Metric, VectorIndex};

/// Embeds every record of a corpus into a position-aligned matrix.
pub struct CorpusEmbedder<'a> {
    generator: &'a dyn EmbeddingGenerator,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> CorpusEmbedder<'a> {
    pub fn new(generator: &'a dyn EmbeddingGenerator, batch_size: usize) -> Self {
        Self {
            generator,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    /// Show a progress bar while embedding.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Row `i` of the result is the embedding of `corpus[i]`.
    ///
    /// Fails as a whole if any batch fails; no partial matrix is returned.
    pub fn build(&self, corpus: &Corpus) -> RecommendResult<EmbeddingMatrix> {
        let texts = corpus.texts();
        let mut matrix = EmbeddingMatrix::with_capacity(self.generator.dimension(), texts.len());

        let progress = self
            .show_progress
            .then(|| create_progress_bar(texts.len() as u64, "Embedding records"));

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let first = batch_no * self.batch_size;

            let rows = self.generator.embed_many(&refs).map_err(|e| {
                RecommendError::VectorizationFailure {
                    reason: format!(
                        "records {first}..{} could not be embedded: {e}",
                        first + batch.len()
                    ),
                }
            })?;
            if rows.len() != batch.len() {
                return Err(RecommendError::VectorizationFailure {
                    reason: format!(
                        "batch at record {first} produced {} rows for {} records",
                        rows.len(),
                        batch.len()
                    ),
                });
            }
            matrix
                .extend(&rows)
                .map_err(|e| RecommendError::VectorizationFailure {
                    reason: e.to_string(),
                })?;

            if let Some(pb) = &progress {
                pb.inc(batch.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        if matrix.len() != corpus.len() {
            return Err(RecommendError::RowCountMismatch {
                index_rows: matrix.len(),
                corpus_len: corpus.len(),
            });
        }
        Ok(matrix)
    }
}

/// Summary of a completed offline build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub records: usize,
    pub dimension: usize,
    pub metric: Metric,
    pub model_name: String,
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
    pub elapsed: Duration,
}

/// Embed `corpus`, build the index, and persist it under `settings.index_dir`.
///
/// `index.bin` and `metadata.json` are each written atomically. The old
/// metadata is removed before the new index lands, so an interrupted build
/// leaves an index without metadata (refused at startup) rather than a
/// mismatched pair.
pub fn build_index(
    settings: &Settings,
    generator: &dyn EmbeddingGenerator,
    corpus: &Corpus,
    show_progress: bool,
) -> RecommendResult<BuildReport> {
    let start = Instant::now();
    let metric = settings.search.metric;

    info!(
        records = corpus.len(),
        model = generator.model_name(),
        %metric,
        "building index"
    );
    if corpus.is_empty() {
        warn!("corpus is empty; the index will return no results");
    }

    let matrix = CorpusEmbedder::new(generator, settings.embedding.batch_size)
        .with_progress(show_progress)
        .build(corpus)?;
    let index = VectorIndex::build(matrix, metric);

    let metadata = IndexMetadata::new(
        generator.model_name(),
        index.dimension().get(),
        corpus.len(),
        metric,
        corpus.digest(),
    );

    let index_path = settings.index_file();
    let metadata_path = settings.metadata_file();

    if metadata_path.exists() {
        std::fs::remove_file(&metadata_path).map_err(|e| RecommendError::PersistFailure {
            artifact: "index metadata",
            path: metadata_path.clone(),
            reason: e.to_string(),
        })?;
    }
    index
        .save(&index_path)
        .map_err(|e| RecommendError::PersistFailure {
            artifact: "index",
            path: index_path.clone(),
            reason: e.to_string(),
        })?;
    metadata.save(&metadata_path)?;

    let report = BuildReport {
        records: index.len(),
        dimension: index.dimension().get(),
        metric,
        model_name: generator.model_name().to_string(),
        index_path,
        metadata_path,
        elapsed: start.elapsed(),
    };
    info!(
        records = report.records,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "index written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Record;
    use crate::vector::{MockEmbeddingGenerator, VectorDimension, VectorError};
    use tempfile::TempDir;

    fn corpus() -> Corpus {
        Corpus::from_records(vec![
            Record::new("Numerical", "u0", "fast numeric reasoning test"),
            Record::new("Personality", "u1", "personality and behavior questionnaire"),
            Record::new("Coding", "u2", "coding skills simulation"),
            Record::new("Verbal", "u3", "verbal reasoning comprehension"),
            Record::new("Empty", "u4", ""),
        ])
    }

    #[test]
    fn test_rows_align_with_corpus_across_batches() {
        let generator = MockEmbeddingGenerator::new();
        let corpus = corpus();

        let batched = CorpusEmbedder::new(&generator, 2).build(&corpus).unwrap();
        assert_eq!(batched.len(), corpus.len());

        for (i, text) in corpus.texts().iter().enumerate() {
            let single = generator.embed(text).unwrap();
            assert_eq!(batched.row(i).unwrap(), single.as_slice(), "row {i}");
        }
    }

    struct FailingGenerator {
        fail_on: &'static str,
    }

    impl EmbeddingGenerator for FailingGenerator {
        fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
            if texts.contains(&self.fail_on) {
                return Err(VectorError::EmbeddingFailed("untokenizable".to_string()));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> VectorDimension {
            VectorDimension::new(2).unwrap()
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_one_failure_aborts_build_and_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.index_dir = temp_dir.path().join("index");

        let generator = FailingGenerator {
            fail_on: "coding skills simulation",
        };
        let result = build_index(&settings, &generator, &corpus(), false);

        assert!(matches!(
            result,
            Err(RecommendError::VectorizationFailure { .. })
        ));
        assert!(!settings.index_file().exists());
        assert!(!settings.metadata_file().exists());
    }

    #[test]
    fn test_build_index_persists_index_and_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.index_dir = temp_dir.path().join("index");
        settings.search.metric = Metric::L2;

        let generator = MockEmbeddingGenerator::new();
        let corpus = corpus();
        let report = build_index(&settings, &generator, &corpus, false).unwrap();

        assert_eq!(report.records, 5);
        assert_eq!(report.dimension, 384);

        let index = VectorIndex::load(settings.index_file()).unwrap();
        assert_eq!(index.len(), 5);
        assert_eq!(index.metric(), Metric::L2);

        let metadata = IndexMetadata::load(&settings.metadata_file()).unwrap();
        assert_eq!(metadata.record_count, 5);
        assert_eq!(metadata.model_name, "mock");
        assert_eq!(metadata.corpus_digest, corpus.digest());
    }
}
