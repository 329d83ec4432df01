use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{RagError, Result};
use crate::llm::embeddings::EmbeddingMatrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Row of the indexed matrix, which is also the chunk position.
    pub index: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Exact nearest-neighbour search over a fixed matrix, by brute force.
///
/// Immutable once built; a new document means a new index.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    vectors: EmbeddingMatrix,
}

impl FlatL2Index {
    pub fn build(vectors: EmbeddingMatrix) -> Result<Self> {
        if vectors.ncols() == 0 {
            return Err(RagError::Embedding(
                "Cannot index zero-dimensional embeddings".to_string(),
            ));
        }
        log::debug!(
            "Built flat L2 index: {} vectors, {} dimensions",
            vectors.nrows(),
            vectors.ncols()
        );
        Ok(Self { vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.nrows() == 0
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Returns the `k` closest rows, nearest first. `k` is clamped to the
    /// number of indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension() {
            return Err(RagError::Embedding(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimension()
            )));
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = ArrayView1::from(query);
        let mut hits: Vec<SearchHit> = self
            .vectors
            .outer_iter()
            .enumerate()
            .map(|(index, row)| {
                let diff = &row - &query;
                SearchHit {
                    index,
                    distance: diff.dot(&diff),
                }
            })
            .collect();

        // stable sort keeps lower row first on ties
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        hits.truncate(k);

        log::debug!("Index search returned {} of {} vectors", hits.len(), self.len());
        Ok(hits)
    }
}
