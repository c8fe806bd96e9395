//! Vector search functionality for catalog retrieval.
//!
//! This module provides the embedding model wrapper, the dense embedding
//! matrix, and an exact flat index with a binary persistence format.
//!
//! # Architecture
//! Every stored and every query vector is unit-normalized by
//! [`EmbeddingGenerator::embed_many`], so the default inner-product metric
//! is cosine similarity. Search is an exhaustive linear scan; the index is
//! built once offline and loaded read-only by the online service.

mod embedding;
mod index;
mod matrix;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{EmbeddingGenerator, FastEmbedGenerator, parse_embedding_model};
pub use index::{IndexHeader, Neighbor, VectorIndex};
pub use matrix::EmbeddingMatrix;
pub use types::{
    Metric, VECTOR_DIMENSION_384, VectorDimension, VectorError, dot, l2_normalize, squared_l2,
};
