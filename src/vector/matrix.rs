//! Dense row-major embedding matrix.
//!
//! Row `i` always belongs to corpus position `i`. Nothing in this type
//! reorders rows; callers append in corpus order.

use crate::vector::{VectorDimension, VectorError};

/// Contiguous `rows x dimension` block of `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dimension: VectorDimension,
    rows: usize,
}

impl EmbeddingMatrix {
    /// Creates an empty matrix that accepts rows of `dimension` values.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            data: Vec::new(),
            dimension,
            rows: 0,
        }
    }

    /// Creates an empty matrix with room for `rows` rows.
    #[must_use]
    pub fn with_capacity(dimension: VectorDimension, rows: usize) -> Self {
        Self {
            data: Vec::with_capacity(rows * dimension.get()),
            dimension,
            rows: 0,
        }
    }

    /// Builds a matrix from a flat row-major buffer.
    pub fn from_flat(data: Vec<f32>, dimension: VectorDimension) -> Result<Self, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::InvalidFormat(format!(
                "{} values do not divide into rows of {dimension}",
                data.len()
            )));
        }
        let rows = data.len() / dimension.get();
        Ok(Self {
            data,
            dimension,
            rows,
        })
    }

    /// Builds a matrix from owned rows, validating every row's length.
    pub fn from_rows(rows: Vec<Vec<f32>>, dimension: VectorDimension) -> Result<Self, VectorError> {
        let mut matrix = Self::with_capacity(dimension, rows.len());
        for row in &rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Appends one row.
    pub fn push_row(&mut self, row: &[f32]) -> Result<(), VectorError> {
        self.dimension.validate_vector(row)?;
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    /// Appends every row of `other`.
    pub fn extend(&mut self, other: &EmbeddingMatrix) -> Result<(), VectorError> {
        if other.dimension != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension.get(),
                actual: other.dimension.get(),
            });
        }
        self.data.extend_from_slice(&other.data);
        self.rows += other.rows;
        Ok(())
    }

    /// Returns row `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let dim = self.dimension.get();
        Some(&self.data[index * dim..(index + 1) * dim])
    }

    /// Iterates rows in position order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.get())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// The raw row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the matrix and returns its rows as owned vectors.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<f32>> {
        self.data
            .chunks_exact(self.dimension.get())
            .map(<[f32]>::to_vec)
            .collect()
    }
}
