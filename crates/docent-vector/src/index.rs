//! Flat (exhaustive) L2 index.
//!
//! Vectors are stored contiguously in insertion order. A vector's position is
//! its ordinal in that storage, so positions are always dense (`0..len`).
//! Removal compacts the storage: survivors keep their relative order and are
//! renumbered, which is exactly what an owner keeping a parallel
//! position-indexed list gets by filtering that list with the same set.

use crate::distance::{euclidean_distance, squared_euclidean};
use crate::error::{Error, Result};
use crate::types::{Position, SearchHit};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Range;
use tracing::{debug, trace};

/// Default embedding dimensionality (Gemini `embedding-001`).
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Exact nearest-neighbor index over fixed-dimension vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimensions: usize,
    /// Row-major vector storage, `len * dimensions` floats.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Configuration("Dimensions must be > 0".to_string()));
        }
        Ok(Self {
            dimensions,
            data: Vec::new(),
        })
    }

    pub(crate) fn from_raw(dimensions: usize, data: Vec<f32>) -> Result<Self> {
        if dimensions == 0 || data.len() % dimensions != 0 {
            return Err(Error::Persistence(format!(
                "Snapshot holds {} floats, not a multiple of {} dimensions",
                data.len(),
                dimensions
            )));
        }
        Ok(Self { dimensions, data })
    }

    pub(crate) fn raw(&self) -> &[f32] {
        &self.data
    }

    /// Get the vector dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the vector stored at `position`.
    pub fn vector(&self, position: Position) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimensions;
        Some(&self.data[start..start + self.dimensions])
    }

    fn validate(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| v.is_nan() || v.is_infinite()) {
            return Err(Error::InvalidVector(
                "Vector contains NaN or Inf".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that every vector would be accepted by [`FlatIndex::add`].
    pub fn validate_all<V: AsRef<[f32]>>(&self, vectors: &[V]) -> Result<()> {
        vectors.iter().try_for_each(|v| self.validate(v.as_ref()))
    }

    /// Append vectors in order; each receives the next sequential position.
    ///
    /// All vectors are validated before any is stored, so a rejected batch
    /// leaves the index untouched. Returns the range of assigned positions.
    pub fn add<V: AsRef<[f32]>>(&mut self, vectors: &[V]) -> Result<Range<Position>> {
        self.validate_all(vectors)?;

        let first = self.len();
        self.data.reserve(vectors.len() * self.dimensions);
        for vector in vectors {
            self.data.extend_from_slice(vector.as_ref());
        }

        trace!(first, count = vectors.len(), "Added vectors");
        Ok(first..self.len())
    }

    /// Return up to `k` nearest vectors, nearest first.
    ///
    /// Ties are broken by position (lower first). Asking for more results
    /// than the index holds returns every vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(Position, f32)> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| (position, squared_euclidean(query, vector)))
            .collect();

        let by_distance = |a: &(Position, f32), b: &(Position, f32)| -> Ordering {
            a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance);

        Ok(scored
            .into_iter()
            .map(|(position, _)| SearchHit {
                position,
                distance: euclidean_distance(query, self.stored(position)),
            })
            .collect())
    }

    fn stored(&self, position: Position) -> &[f32] {
        let start = position * self.dimensions;
        &self.data[start..start + self.dimensions]
    }

    /// Delete the vectors at the given positions and compact the storage.
    ///
    /// Out-of-range and repeated positions are ignored. Returns the number of
    /// vectors actually removed.
    pub fn remove_positions(&mut self, positions: &[Position]) -> usize {
        let len = self.len();
        let doomed: HashSet<Position> = positions.iter().copied().filter(|&p| p < len).collect();
        if doomed.is_empty() {
            return 0;
        }

        let dims = self.dimensions;
        let mut kept = Vec::with_capacity((len - doomed.len()) * dims);
        for (position, vector) in self.data.chunks_exact(dims).enumerate() {
            if !doomed.contains(&position) {
                kept.extend_from_slice(vector);
            }
        }
        self.data = kept;

        debug!(removed = doomed.len(), remaining = self.len(), "Removed vectors");
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(vectors: &[[f32; 2]]) -> FlatIndex {
        let mut index = FlatIndex::new(2).unwrap();
        index.add(vectors).unwrap();
        index
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(FlatIndex::new(0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_add_assigns_sequential_positions() {
        let mut index = FlatIndex::new(2).unwrap();
        assert_eq!(index.add(&[[0.0, 0.0], [1.0, 1.0]]).unwrap(), 0..2);
        assert_eq!(index.add(&[[2.0, 2.0]]).unwrap(), 2..3);
        assert_eq!(index.len(), 3);
        assert_eq!(index.vector(2), Some(&[2.0, 2.0][..]));
    }

    #[test]
    fn test_add_rejects_whole_batch_on_bad_vector() {
        let mut index = FlatIndex::new(2).unwrap();
        let result = index.add(&[vec![0.0, 0.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(index.is_empty());

        let result = index.add(&[vec![f32::NAN, 0.0]]);
        assert!(matches!(result, Err(Error::InvalidVector(_))));
    }

    #[test]
    fn test_validate_all_does_not_mutate() {
        let index = index_with(&[[1.0, 0.0]]);
        assert!(index.validate_all(&[[0.5, 0.5]]).is_ok());
        assert!(matches!(
            index.validate_all(&[vec![0.0, 0.0], vec![f32::INFINITY, 0.0]]),
            Err(Error::InvalidVector(_))
        ));
        assert!(matches!(
            index.validate_all(&[vec![0.0, 0.0, 0.0]]),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = index_with(&[[5.0, 0.0], [1.0, 0.0], [3.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<_> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 2, 0]);
        assert!((hits[0].distance - 1.0).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_search_ties_prefer_lower_position() {
        let index = index_with(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn test_search_k_larger_than_len() {
        let index = index_with(&[[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 2);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = index_with(&[[1.0, 0.0]]);
        assert!(index.search(&[0.0, 0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_remove_positions_compacts() {
        let mut index = index_with(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        assert_eq!(index.remove_positions(&[1, 3]), 2);
        assert_eq!(index.len(), 2);
        assert_eq!(index.vector(0), Some(&[0.0, 0.0][..]));
        assert_eq!(index.vector(1), Some(&[2.0, 2.0][..]));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut index = index_with(&[[0.0, 0.0]]);
        assert_eq!(index.remove_positions(&[7, 42]), 0);
        assert_eq!(index.remove_positions(&[0, 0]), 1);
        assert_eq!(index.remove_positions(&[0]), 0);
        assert!(index.is_empty());
    }
}
