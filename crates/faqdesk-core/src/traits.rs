use crate::types::Neighbors;

/// Maps text to fixed-dimension vectors. Must be deterministic for a fixed
/// model version.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Read-only nearest-neighbour search over the catalog embeddings.
///
/// Implementations must be safe for concurrent `search` calls.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Neighbors>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
