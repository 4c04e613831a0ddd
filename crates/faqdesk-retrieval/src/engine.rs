use std::sync::Arc;

use faqdesk_core::config::RetrievalSettings;
use faqdesk_core::traits::Embedder;
use faqdesk_core::types::{MetadataField, MetadataFilters, SearchResult};

use crate::error::{IntegrityFault, RetrievalError};
use crate::knowledge::KnowledgeBase;
use crate::relax::relax;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub k: usize,
    /// Candidates must score strictly above this.
    pub similarity_threshold: f32,
    /// Fields that must match outright; empty unless configured.
    pub strict_fields: Vec<MetadataField>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { k: 5, similarity_threshold: 0.3, strict_fields: Vec::new() }
    }
}

impl From<&RetrievalSettings> for RetrievalOptions {
    fn from(s: &RetrievalSettings) -> Self {
        Self { k: s.k, similarity_threshold: s.similarity_threshold, strict_fields: s.strict_fields.clone() }
    }
}

impl RetrievalOptions {
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.k == 0 {
            return Err(RetrievalError::InvalidInput("k must be positive".into()));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(RetrievalError::InvalidInput(format!(
                "similarity threshold must be finite, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of one retrieval call.
///
/// An empty `results` with no `faults` means nothing cleared the threshold.
/// Any fault means the index and catalog disagree and the answer may be
/// missing entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    pub results: Vec<SearchResult>,
    pub faults: Vec<IntegrityFault>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        !self.faults.is_empty()
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        self.results
    }
}

/// Stateless FAQ retrieval over a shared `KnowledgeBase`.
///
/// Every call is a pure function of the query, the filters and the snapshot,
/// so one engine can serve concurrent requests.
pub struct RetrievalEngine {
    kb: Arc<KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    defaults: RetrievalOptions,
}

impl RetrievalEngine {
    pub fn new(kb: Arc<KnowledgeBase>, embedder: Arc<dyn Embedder>, defaults: RetrievalOptions) -> Result<Self, RetrievalError> {
        defaults.validate()?;
        let (embed_dim, index_dim) = (embedder.dim(), kb.index().dim());
        if embed_dim != index_dim {
            return Err(RetrievalError::InvalidConfig(format!(
                "embedder produces {embed_dim}-d vectors but the index holds {index_dim}-d vectors"
            )));
        }
        Ok(Self { kb, embedder, defaults })
    }

    /// Retrieve with explicit `k` and threshold; strict fields come from the
    /// engine defaults.
    pub fn retrieve(
        &self,
        query: &str,
        filters: Option<&MetadataFilters>,
        k: usize,
        similarity_threshold: f32,
    ) -> Result<Retrieval, RetrievalError> {
        let options = RetrievalOptions { k, similarity_threshold, strict_fields: self.defaults.strict_fields.clone() };
        self.retrieve_with(query, filters, &options)
    }

    pub fn retrieve_default(&self, query: &str, filters: Option<&MetadataFilters>) -> Result<Retrieval, RetrievalError> {
        self.retrieve_with(query, filters, &self.defaults)
    }

    pub fn retrieve_with(
        &self,
        query: &str,
        filters: Option<&MetadataFilters>,
        options: &RetrievalOptions,
    ) -> Result<Retrieval, RetrievalError> {
        options.validate()?;
        let query_vec = self.embedder.embed(query).map_err(RetrievalError::Embedding)?;
        let (candidates, faults) = self.candidates(&query_vec, filters, options)?;
        let results = relax(candidates, filters, &options.strict_fields);
        tracing::debug!(k = options.k, returned = results.len(), faults = faults.len(), "faq retrieval");
        Ok(Retrieval { results, faults })
    }

    /// Threshold-filtered, strictly-matched candidates in descending similarity.
    fn candidates(
        &self,
        query_vec: &[f32],
        filters: Option<&MetadataFilters>,
        options: &RetrievalOptions,
    ) -> Result<(Vec<SearchResult>, Vec<IntegrityFault>), RetrievalError> {
        let index = self.kb.index();
        // Slots past the stored rows could only be padding.
        let k = options.k.min(index.len());
        let neighbors = index.search(query_vec, k).map_err(RetrievalError::Index)?;
        let catalog = self.kb.catalog();
        let strict: Vec<MetadataField> = match filters {
            Some(f) => options.strict_fields.iter().copied().filter(|s| f.get(*s).is_some()).collect(),
            None => Vec::new(),
        };

        let mut results = Vec::with_capacity(neighbors.len());
        let mut faults = Vec::new();
        for (id, distance) in neighbors.iter() {
            let similarity = 1.0 - distance;
            if similarity.is_nan() || similarity <= options.similarity_threshold {
                continue;
            }
            if id < 0 {
                continue;
            }
            let Some(entry) = catalog.get(id) else {
                let fault = IntegrityFault { id, catalog_len: catalog.len() };
                tracing::warn!(%fault, "skipping index candidate");
                faults.push(fault);
                continue;
            };
            if let Some(f) = filters {
                if !f.matches_on(&entry.metadata, &strict) {
                    continue;
                }
            }
            results.push(SearchResult {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                metadata: entry.metadata.clone(),
                similarity_score: similarity,
            });
        }
        // Stable, so equal scores keep index order.
        results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        Ok((results, faults))
    }
}
