//! Exact (flat) vector index with a self-contained binary form.
//!
//! Search scans every row. At catalog scale (hundreds to low thousands of
//! rows) this is both exact and fast enough, and it keeps the result order
//! fully deterministic.
//!
//! # Storage Format
//!
//! All integers and floats are little-endian:
//! - Magic (4 bytes): `AIDX`
//! - Version (`u32`)
//! - Metric tag (`u32`): 0 = inner product, 1 = squared L2
//! - Dimension (`u32`)
//! - Row count (`u64`)
//! - Rows: `row_count * dimension` contiguous `f32` values

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::vector::{EmbeddingMatrix, Metric, VectorDimension, VectorError};

/// Current storage format version.
const INDEX_VERSION: u32 = 1;

/// Magic bytes to identify index files.
const MAGIC_BYTES: &[u8; 4] = b"AIDX";

/// Size of the fixed header in bytes.
const HEADER_SIZE: usize = 24;

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Below this many rows the scan stays on the calling thread.
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

/// One search hit: a corpus position and its metric score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

/// Immutable exhaustive-search index over an [`EmbeddingMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    matrix: EmbeddingMatrix,
    metric: Metric,
}

impl VectorIndex {
    /// Takes ownership of `matrix`; no approximation structure is built.
    #[must_use]
    pub fn build(matrix: EmbeddingMatrix, metric: Metric) -> Self {
        Self { matrix, metric }
    }

    /// Returns the `min(k, len)` best rows for `query`, best first.
    ///
    /// Equal scores are ordered by ascending position.
    ///
    /// # Errors
    /// `InvalidArgument` if `k == 0`; `DimensionMismatch` if the query width
    /// differs from the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }
        self.matrix.dimension().validate_vector(query)?;

        let metric = self.metric;
        let scores: Vec<f32> = if self.matrix.len() >= PARALLEL_SCAN_THRESHOLD {
            self.matrix
                .as_slice()
                .par_chunks_exact(self.matrix.dimension().get())
                .map(|row| metric.score(query, row))
                .collect()
        } else {
            self.matrix
                .rows()
                .map(|row| metric.score(query, row))
                .collect()
        };

        let mut neighbors: Vec<Neighbor> = scores
            .into_iter()
            .enumerate()
            .map(|(position, score)| Neighbor { position, score })
            .collect();

        // Stable sort keeps ascending positions among ties.
        neighbors.sort_by(|a, b| metric.rank(a.score, b.score));
        neighbors.truncate(k.min(self.matrix.len()));

        Ok(neighbors)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.matrix.dimension()
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[must_use]
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        self.matrix.row(position)
    }

    #[must_use]
    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    /// Encodes the index into its binary form.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let values = self.matrix.as_slice();
        let mut bytes = Vec::with_capacity(HEADER_SIZE + values.len() * BYTES_PER_F32);

        bytes.extend_from_slice(MAGIC_BYTES);
        bytes.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        bytes.extend_from_slice(&self.metric.to_tag().to_le_bytes());
        bytes.extend_from_slice(&(self.matrix.dimension().get() as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.matrix.len() as u64).to_le_bytes());
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        bytes
    }

    /// Decodes an index produced by [`VectorIndex::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, VectorError> {
        let header = IndexHeader::read(bytes)?;

        let expected_len = header
            .row_count
            .checked_mul(header.dimension.get())
            .and_then(|n| n.checked_mul(BYTES_PER_F32))
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(|| VectorError::InvalidFormat("row count overflows".to_string()))?;
        if bytes.len() != expected_len {
            return Err(VectorError::InvalidFormat(format!(
                "expected {expected_len} bytes for {} rows of {}, found {}",
                header.row_count,
                header.dimension,
                bytes.len()
            )));
        }

        let data: Vec<f32> = bytes[HEADER_SIZE..]
            .chunks_exact(BYTES_PER_F32)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        let matrix = EmbeddingMatrix::from_flat(data, header.dimension)?;

        Ok(Self {
            matrix,
            metric: header.metric,
        })
    }

    /// Writes the index to `path` atomically.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over `path`, so readers never observe a partial index.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VectorError> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&self.serialize())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| VectorError::Storage(e.error))?;

        debug!(path = %path.display(), rows = self.len(), "index written");
        Ok(())
    }

    /// Loads an index file written by [`VectorIndex::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VectorError> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the file is opened read-only and only read for the duration
        // of this call; the decoded matrix owns its own copy of the data.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::deserialize(&mmap)
    }

    /// Reads only the header of an index file.
    pub fn read_header(path: impl AsRef<Path>) -> Result<IndexHeader, VectorError> {
        let file = File::open(path.as_ref())?;
        // SAFETY: read-only mapping, dropped before returning.
        let mmap = unsafe { Mmap::map(&file)? };
        IndexHeader::read(&mmap)
    }
}

/// Decoded fixed-size header of an index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u32,
    pub metric: Metric,
    pub dimension: VectorDimension,
    pub row_count: usize,
}

impl IndexHeader {
    fn read(bytes: &[u8]) -> Result<Self, VectorError> {
        if bytes.len() < HEADER_SIZE {
            return Err(VectorError::InvalidFormat(
                "file too small to contain header".to_string(),
            ));
        }
        if &bytes[0..4] != MAGIC_BYTES {
            return Err(VectorError::InvalidFormat("invalid magic bytes".to_string()));
        }

        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let version = u32_at(4);
        if version != INDEX_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: INDEX_VERSION,
                actual: version,
            });
        }
        let metric = Metric::from_tag(u32_at(8))?;
        let dimension = VectorDimension::new(u32_at(12) as usize)?;

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[16..24]);
        let row_count = usize::try_from(u64::from_le_bytes(count_bytes))
            .map_err(|_| VectorError::InvalidFormat("row count overflows".to_string()))?;

        Ok(Self {
            version,
            metric,
            dimension,
            row_count,
        })
    }
}
