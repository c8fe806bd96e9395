//! Embedding generation for catalog text and queries.
//!
//! The same [`EmbeddingGenerator`] instance embeds the corpus offline and the
//! queries online, and both paths go through [`EmbeddingGenerator::embed_many`],
//! which L2-normalizes every row. Inner-product scores are therefore cosine
//! similarities and comparable between build time and query time.

use crate::config::EmbeddingConfig;
use crate::vector::{EmbeddingMatrix, VectorDimension, VectorError, l2_normalize};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Trait for generating embeddings from text.
///
/// Implementations must be deterministic for a fixed model and safe to share
/// between request threads.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate raw (not necessarily normalized) embeddings, one per text.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Name recorded in index metadata to detect model drift.
    #[must_use]
    fn model_name(&self) -> &str;

    /// Embed a batch of texts into a unit-normalized matrix.
    ///
    /// Row `i` of the result corresponds to `texts[i]`.
    fn embed_many(&self, texts: &[&str]) -> Result<EmbeddingMatrix, VectorError> {
        let dimension = self.dimension();
        if texts.is_empty() {
            return Ok(EmbeddingMatrix::new(dimension));
        }

        let raw = self.generate_embeddings(texts)?;
        if raw.len() != texts.len() {
            return Err(VectorError::EmbeddingFailed(format!(
                "model returned {} embeddings for {} texts",
                raw.len(),
                texts.len()
            )));
        }

        let mut matrix = EmbeddingMatrix::with_capacity(dimension, raw.len());
        for mut embedding in raw {
            l2_normalize(&mut embedding);
            matrix.push_row(&embedding)?;
        }
        Ok(matrix)
    }

    /// Embed one text into a unit-normalized vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.embed_many(&[text])?
            .into_rows()
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::EmbeddingFailed("model returned no embedding".to_string()))
    }
}

/// FastEmbed implementation backed by a local ONNX model.
///
/// The ONNX session is not shared between concurrent inferences; the mutex
/// is held only for the duration of one `embed` call.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
    batch_size: usize,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load the model named in `config`.
    ///
    /// # Errors
    /// Returns an error if the model name is unknown or the model fails to
    /// initialize or download.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, VectorError> {
        let model = parse_embedding_model(&config.model)?;
        let cache_dir = config.cache_dir();

        let has_cached_models = cache_dir.exists()
            && cache_dir
                .read_dir()
                .is_ok_and(|mut entries| entries.any(|_| true));
        if has_cached_models {
            info!(model = %config.model, "loading embedding model from cache");
        } else {
            info!(model = %config.model, "downloading embedding model (first time only)");
        }

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(config.show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        // Measure the output width instead of trusting a table of model sizes.
        let sample = text_model
            .embed(vec!["test"], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to run model: {e}")))?;
        let width = sample.first().map(Vec::len).unwrap_or_default();
        let dimension = VectorDimension::new(width)?;
        debug!(dimension = width, "embedding model ready");

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: config.model.clone(),
            dimension,
            batch_size: config.batch_size.max(1),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .embed(text_strings, Some(self.batch_size))
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Map a configured model name to a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    let model = match name.to_ascii_lowercase().as_str() {
        "allminilml6v2" | "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "allminilml12v2" | "all-minilm-l12-v2" => EmbeddingModel::AllMiniLML12V2,
        "paraphrasemultilingualminilml12v2" | "paraphrase-multilingual-minilm-l12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        "bgesmallenv15" | "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bgebaseenv15" | "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "multilinguale5small" | "multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        "nomicembedtextv15" | "nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
        _ => {
            return Err(VectorError::EmbeddingFailed(format!(
                "Unknown embedding model '{name}'. Supported: AllMiniLML6V2, AllMiniLML12V2, \
                 ParaphraseMultilingualMiniLML12V2, BGESmallENV15, BGEBaseENV15, \
                 MultilingualE5Small, NomicEmbedTextV15"
            )));
        }
    };
    Ok(model)
}

/// Mock embedding generator for testing.
///
/// Hashes each lowercase word (minus a few stop words) into a bucket, so
/// texts that share vocabulary get nearby vectors.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    /// Create a new mock generator with standard 384 dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::dimension_384(),
        }
    }

    /// Create a generator with custom dimension for testing.
    #[must_use]
    pub fn with_dimension(dimension: VectorDimension) -> Self {
        Self { dimension }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
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
                    let bucket = word
                        .bytes()
                        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
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
        "mock"
    }
}
