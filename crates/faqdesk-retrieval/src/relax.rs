use faqdesk_core::types::{MetadataField, MetadataFilters, SearchResult};

/// Narrow `candidates` to the most specific non-empty metadata tier.
///
/// With `filter_fields` the supplied fields minus `strict_fields`, tries the
/// leading `n` fields for `n = len..=1` and returns the first non-empty
/// subset. When nothing matches, or there is nothing to filter on, the
/// candidates come back untouched. Order is preserved.
pub fn relax(candidates: Vec<SearchResult>, filters: Option<&MetadataFilters>, strict_fields: &[MetadataField]) -> Vec<SearchResult> {
    let Some(filters) = filters.filter(|f| !f.is_empty()) else {
        return candidates;
    };
    if candidates.is_empty() {
        return candidates;
    }

    let filter_fields: Vec<MetadataField> = filters.fields().filter(|f| !strict_fields.contains(f)).collect();
    for n in (1..=filter_fields.len()).rev() {
        let leading = &filter_fields[..n];
        let tier: Vec<SearchResult> = candidates
            .iter()
            .filter(|c| filters.matches_on(&c.metadata, leading))
            .cloned()
            .collect();
        if !tier.is_empty() {
            tracing::debug!(fields = n, of = filter_fields.len(), kept = tier.len(), "metadata tier matched");
            return tier;
        }
    }
    tracing::debug!(candidates = candidates.len(), "no metadata tier matched, returning unfiltered candidates");
    candidates
}
