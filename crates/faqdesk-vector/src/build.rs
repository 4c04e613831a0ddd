use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use faqdesk_core::catalog::Catalog;
use faqdesk_core::traits::Embedder;

use crate::store::FaqStore;

/// Embed every catalog question in order, `batch_size` at a time.
///
/// The returned matrix is positionally aligned with `catalog`.
pub fn embed_catalog(catalog: &Catalog, embedder: &dyn Embedder, batch_size: usize) -> Result<Vec<Vec<f32>>> {
    let questions = catalog.questions();
    let pb = ProgressBar::new(questions.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({percent}%) {msg}")?.progress_chars("#>-"));
    let mut embeddings = Vec::with_capacity(questions.len());
    for batch in questions.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch)?;
        if vectors.len() != batch.len() {
            bail!("embedder returned {} vectors for {} texts", vectors.len(), batch.len());
        }
        embeddings.extend(vectors);
        pb.set_position(embeddings.len() as u64);
    }
    pb.finish_with_message("embedded");
    Ok(embeddings)
}

/// Embed `catalog` and replace the contents of `store` with it.
pub async fn build_store(store: &FaqStore, catalog: &Catalog, embedder: &dyn Embedder, batch_size: usize) -> Result<usize> {
    if catalog.is_empty() {
        bail!("QA catalog is empty");
    }
    tracing::info!(entries = catalog.len(), dim = embedder.dim(), "embedding catalog");
    let embeddings = embed_catalog(catalog, embedder, batch_size)?;
    store.write(catalog, &embeddings).await
}
