use std::sync::Arc;

use faqdesk_core::catalog::Catalog;
use faqdesk_core::error::{Error, Result};
use faqdesk_core::traits::VectorIndex;

/// The process-wide, read-only FAQ snapshot: catalog plus the index built
/// over its embeddings. Constructed once at startup and shared via `Arc`.
pub struct KnowledgeBase {
    catalog: Catalog,
    index: Arc<dyn VectorIndex>,
}

impl KnowledgeBase {
    /// Fails when the index and catalog sizes disagree.
    pub fn new(catalog: Catalog, index: Arc<dyn VectorIndex>) -> Result<Self> {
        if catalog.len() != index.len() {
            return Err(Error::DataIntegrity(format!(
                "catalog has {} entries but the index holds {} vectors",
                catalog.len(),
                index.len()
            )));
        }
        Ok(Self { catalog, index })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }
}
