use anyhow::{bail, Result};

use faqdesk_core::traits::VectorIndex;
use faqdesk_core::types::{DistanceMetric, Neighbors};

/// Exact nearest-neighbour index over an in-memory embedding matrix.
///
/// Vector id `i` is row `i` of the matrix it was built from. The index is
/// immutable after construction, so concurrent searches need no locking.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    metric: DistanceMetric,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl FlatIndex {
    pub fn build(dim: usize, metric: DistanceMetric, embeddings: &[Vec<f32>]) -> Result<Self> {
        if dim == 0 {
            bail!("index dimension must be positive");
        }
        let mut data = Vec::with_capacity(dim * embeddings.len());
        let mut norms = Vec::with_capacity(embeddings.len());
        for (row, v) in embeddings.iter().enumerate() {
            if v.len() != dim {
                bail!("embedding row {} has dimension {}, expected {}", row, v.len(), dim);
            }
            norms.push(l2_norm(v));
            data.extend_from_slice(v);
        }
        Ok(Self { dim, metric, data, norms })
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    fn distance(&self, query: &[f32], query_norm: f32, i: usize) -> f32 {
        let v = self.row(i);
        match self.metric {
            DistanceMetric::SquaredL2 => query.iter().zip(v).map(|(a, b)| (a - b) * (a - b)).sum(),
            DistanceMetric::Cosine => {
                let denom = query_norm * self.norms[i];
                if denom == 0.0 {
                    return 1.0;
                }
                let dot: f32 = query.iter().zip(v).map(|(a, b)| a * b).sum();
                1.0 - dot / denom
            }
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.norms.len()
    }

    /// Closest `k` rows, ascending by distance, ties broken by lower id.
    /// Slots beyond the number of stored rows are padded with id `-1` and
    /// distance `+∞`.
    fn search(&self, query: &[f32], k: usize) -> Result<Neighbors> {
        if query.len() != self.dim {
            bail!("query has dimension {}, index expects {}", query.len(), self.dim);
        }
        let query_norm = l2_norm(query);
        let mut scored: Vec<(f32, usize)> =
            (0..self.len()).map(|i| (self.distance(query, query_norm, i), i)).collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        let mut out = Neighbors {
            distances: scored.iter().map(|(d, _)| *d).collect(),
            ids: scored.iter().map(|(_, i)| *i as i64).collect(),
        };
        while out.ids.len() < k {
            out.ids.push(Neighbors::PADDING_ID);
            out.distances.push(f32::INFINITY);
        }
        Ok(out)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
