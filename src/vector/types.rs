//! Type-safe wrappers and core types for vector search functionality.
//!
//! This module provides newtypes and error types following the project's
//! strict type safety guidelines. All types implement necessary traits
//! for ergonomic usage while preventing primitive obsession.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Standard vector dimension for all-MiniLM-L6-v2 embeddings.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent
/// dimension mismatches between an index and the model querying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distance metric used by the exhaustive index.
///
/// `InnerProduct` equals cosine similarity when both sides are unit vectors;
/// higher is better. `L2` is the squared Euclidean distance; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    InnerProduct,
    L2,
}

impl Metric {
    /// Scores `query` against one stored row.
    #[inline]
    #[must_use]
    pub fn score(self, query: &[f32], row: &[f32]) -> f32 {
        match self {
            Metric::InnerProduct => dot(query, row),
            Metric::L2 => squared_l2(query, row),
        }
    }

    /// Orders two scores so that the better one sorts first.
    #[inline]
    #[must_use]
    pub fn rank(self, a: f32, b: f32) -> Ordering {
        match self {
            Metric::InnerProduct => b.total_cmp(&a),
            Metric::L2 => a.total_cmp(&b),
        }
    }

    /// Stable tag written into the index header.
    #[must_use]
    pub const fn to_tag(self) -> u32 {
        match self {
            Metric::InnerProduct => 0,
            Metric::L2 => 1,
        }
    }

    /// Inverse of [`Metric::to_tag`].
    pub fn from_tag(tag: u32) -> Result<Self, VectorError> {
        match tag {
            0 => Ok(Metric::InnerProduct),
            1 => Ok(Metric::L2),
            other => Err(VectorError::InvalidFormat(format!(
                "unknown metric tag {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Metric::InnerProduct => "inner_product",
            Metric::L2 => "l2",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner_product" | "ip" | "cosine" => Ok(Metric::InnerProduct),
            "l2" | "euclidean" => Ok(Metric::L2),
            other => Err(VectorError::InvalidArgument(format!(
                "unknown metric '{other}' (expected inner_product or l2)"
            ))),
        }
    }
}

/// Dot product of two equal-length slices.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean distance of two equal-length slices.
#[inline]
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Scales `vector` to unit length in place.
///
/// A zero vector is left as is; it has no direction to preserve.
pub fn l2_normalize(vector: &mut [f32]) {
    let magnitude = dot(vector, vector).sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Rebuild the index with the embedding model that is loaded for queries"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),

    #[error("Invalid index format: {0}\nSuggestion: Rebuild the index with `assess-index build`")]
    InvalidFormat(String),

    #[error(
        "Invalid index version: expected {expected}, got {actual}\nSuggestion: Rebuild the index with this version of the tool"
    )]
    VersionMismatch { expected: u32, actual: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(384).unwrap();
        assert_eq!(dim.get(), 384);
        assert_eq!(VectorDimension::dimension_384(), dim);

        assert!(VectorDimension::new(0).is_err());

        assert!(dim.validate_vector(&[0.1; 384]).is_ok());
        match dim.validate_vector(&[0.1; 256]) {
            Err(VectorError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 384);
                assert_eq!(actual, 256);
            }
            other => panic!("Expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_metric_rank_direction() {
        // Inner product: larger first
        assert_eq!(Metric::InnerProduct.rank(0.9, 0.1), Ordering::Less);
        // L2: smaller first
        assert_eq!(Metric::L2.rank(0.1, 0.9), Ordering::Less);
        assert_eq!(Metric::L2.rank(0.5, 0.5), Ordering::Equal);
    }

    #[test]
    fn test_metric_tags_and_names() {
        for metric in [Metric::InnerProduct, Metric::L2] {
            assert_eq!(Metric::from_tag(metric.to_tag()).unwrap(), metric);
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!(Metric::from_tag(7).is_err());
        assert!("manhattan".parse::<Metric>().is_err());
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::InnerProduct);
    }

    #[test]
    fn test_normalize_and_scores() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);

        assert_eq!(squared_l2(&[1.0, 0.0], &[0.0, 1.0]), 2.0);
        assert_eq!(Metric::InnerProduct.score(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }
}
