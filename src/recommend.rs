//! Query-time retrieval: vectorize, search, resolve positions to records.
//!
//! [`Engine`] owns the process-wide state (model, corpus, index). It is
//! assembled once by [`Engine::load`] and shared read-only behind an `Arc`;
//! nothing mutates it afterwards, so concurrent queries need no coordination
//! beyond the model's own per-call lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SearchConfig, Settings};
use crate::corpus::Corpus;
use crate::error::{RecommendError, RecommendResult};
use crate::metadata::IndexMetadata;
use crate::presentation::ResultView;
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator, Metric, VectorIndex};

/// Loaded model, corpus, and index.
pub struct Engine {
    generator: Arc<dyn EmbeddingGenerator>,
    corpus: Corpus,
    index: VectorIndex,
}

impl Engine {
    /// Startup routine: load the model, corpus, index, and metadata.
    ///
    /// Any failure is fatal; there is no fallback to an empty index.
    pub fn load(settings: &Settings) -> RecommendResult<Self> {
        let generator = FastEmbedGenerator::new(&settings.embedding).map_err(|e| {
            RecommendError::load("embedding model", settings.embedding.cache_dir(), e)
        })?;
        Self::load_with_generator(settings, Arc::new(generator))
    }

    /// Same as [`Engine::load`] with an already constructed model.
    pub fn load_with_generator(
        settings: &Settings,
        generator: Arc<dyn EmbeddingGenerator>,
    ) -> RecommendResult<Self> {
        let corpus = Corpus::load(&settings.corpus_path)?;

        let index_path = settings.index_file();
        let index =
            VectorIndex::load(&index_path).map_err(|e| RecommendError::load("index", &index_path, e))?;

        let metadata_path = settings.metadata_file();
        let metadata = IndexMetadata::load(&metadata_path)?;

        let engine = Self::from_parts(generator, corpus, index);
        engine.validate()?;
        engine.check_metadata(&metadata, &metadata_path)?;

        info!(
            records = engine.len(),
            dimension = engine.index.dimension().get(),
            metric = %engine.index.metric(),
            model = engine.generator.model_name(),
            "engine ready"
        );
        Ok(engine)
    }

    /// Assemble an engine without checking alignment.
    ///
    /// Queries still fail with `IndexCorpusMismatch` instead of returning a
    /// wrong record if the parts disagree.
    pub fn from_parts(
        generator: Arc<dyn EmbeddingGenerator>,
        corpus: Corpus,
        index: VectorIndex,
    ) -> Self {
        Self {
            generator,
            corpus,
            index,
        }
    }

    /// Check that index rows match the corpus and the model width.
    pub fn validate(&self) -> RecommendResult<()> {
        if self.index.len() != self.corpus.len() {
            return Err(RecommendError::RowCountMismatch {
                index_rows: self.index.len(),
                corpus_len: self.corpus.len(),
            });
        }

        let expected = self.index.dimension().get();
        let actual = self.generator.dimension().get();
        if expected != actual {
            return Err(RecommendError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }

    fn check_metadata(
        &self,
        metadata: &IndexMetadata,
        path: &std::path::Path,
    ) -> RecommendResult<()> {
        let drift = |reason: String| RecommendError::load("index metadata", path, reason);

        if metadata.model_name != self.generator.model_name() {
            return Err(drift(format!(
                "index was built with model '{}' but '{}' is configured",
                metadata.model_name,
                self.generator.model_name()
            )));
        }
        if metadata.dimension != self.index.dimension().get() {
            return Err(drift(format!(
                "metadata records dimension {} but the index has {}",
                metadata.dimension,
                self.index.dimension()
            )));
        }
        if metadata.metric != self.index.metric() {
            return Err(drift(format!(
                "metadata records metric {} but the index uses {}",
                metadata.metric,
                self.index.metric()
            )));
        }
        if metadata.record_count != self.corpus.len() {
            return Err(drift(format!(
                "index was built from {} records but the corpus has {}",
                metadata.record_count,
                self.corpus.len()
            )));
        }
        if metadata.corpus_digest != self.corpus.digest() {
            return Err(drift(
                "corpus content changed since the index was built".to_string(),
            ));
        }
        Ok(())
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn generator(&self) -> &dyn EmbeddingGenerator {
        self.generator.as_ref()
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn metric(&self) -> Metric {
        self.index.metric()
    }
}

/// Ranked results for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub query: String,
    pub results: Vec<ResultView>,
    pub latency_ms: f64,
}

/// Entry point consumed by the HTTP boundary and the CLI.
///
/// Cloning is cheap; every clone shares the same [`Engine`].
#[derive(Clone)]
pub struct RecommendService {
    engine: Arc<Engine>,
    timeout: Duration,
}

impl RecommendService {
    pub fn new(engine: Arc<Engine>, search: &SearchConfig) -> Self {
        Self {
            engine,
            timeout: Duration::from_millis(search.timeout_ms),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Configured per-request time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return `min(k, N)` records for `text`, best first.
    ///
    /// Fewer results than requested is success.
    ///
    /// # Errors
    /// `InvalidArgument` for `k == 0`, `VectorizationFailure` if the model
    /// fails, `DimensionMismatch` if the index was built with another model,
    /// `IndexCorpusMismatch` if a returned position has no record.
    pub fn recommend(&self, text: &str, k: usize) -> RecommendResult<Recommendation> {
        let start = Instant::now();

        if k == 0 {
            return Err(RecommendError::InvalidArgument {
                reason: "max_results must be a positive integer".to_string(),
            });
        }

        let vector = self
            .engine
            .generator
            .embed(text)
            .map_err(|e| RecommendError::VectorizationFailure {
                reason: e.to_string(),
            })?;

        let neighbors = self
            .engine
            .index
            .search(&vector, k)
            .map_err(RecommendError::from_query)?;

        let corpus = &self.engine.corpus;
        let results = neighbors
            .into_iter()
            .map(|n| {
                corpus
                    .get(n.position)
                    .map(|record| ResultView::from_record(record, n.position, n.score))
                    .ok_or(RecommendError::IndexCorpusMismatch {
                        position: n.position,
                        corpus_len: corpus.len(),
                    })
            })
            .collect::<RecommendResult<Vec<_>>>()?;

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(k, results = results.len(), latency_ms, "recommendation served");

        Ok(Recommendation {
            query: text.to_string(),
            results,
            latency_ms,
        })
    }

    /// Run [`RecommendService::recommend`] on the blocking pool, bounded by
    /// `timeout`.
    ///
    /// On timeout the result is discarded and `Timeout` is returned; the
    /// engine stays usable for the next call.
    pub async fn recommend_with_timeout(
        &self,
        text: String,
        k: usize,
        timeout: Duration,
    ) -> RecommendResult<Recommendation> {
        let service = self.clone();
        let task = tokio::task::spawn_blocking(move || service.recommend(&text, k));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RecommendError::Internal {
                reason: format!("recommendation task failed: {join_error}"),
            }),
            Err(_) => Err(RecommendError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
