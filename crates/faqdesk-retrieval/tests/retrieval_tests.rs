use std::sync::Arc;

use faqdesk_core::catalog::Catalog;
use faqdesk_core::traits::{Embedder, VectorIndex};
use faqdesk_core::types::{DistanceMetric, Meta, MetadataField, MetadataFilters, Neighbors, QaEntry};
use faqdesk_embed::FakeEmbedder;
use faqdesk_retrieval::{IntegrityFault, KnowledgeBase, RetrievalEngine, RetrievalError, RetrievalOptions};
use faqdesk_vector::{embed_catalog, FlatIndex};

/// Always embeds to the same 2-d vector; the scripted index ignores it anyway.
struct ConstEmbedder;

impl Embedder for ConstEmbedder {
    fn dim(&self) -> usize { 2 }
    fn max_len(&self) -> usize { 512 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Replays fixed `(id, distance)` pairs, truncated to `k`.
struct ScriptedIndex {
    len: usize,
    hits: Vec<(i64, f32)>,
}

impl VectorIndex for ScriptedIndex {
    fn dim(&self) -> usize { 2 }
    fn len(&self) -> usize { self.len }
    fn search(&self, _query: &[f32], k: usize) -> anyhow::Result<Neighbors> {
        let hits = self.hits.iter().take(k);
        Ok(Neighbors {
            ids: hits.clone().map(|(id, _)| *id).collect(),
            distances: hits.map(|(_, d)| *d).collect(),
        })
    }
}

fn entry(question: &str, meta: &[(&str, &str)]) -> QaEntry {
    let metadata: Meta = meta.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    QaEntry { question: question.into(), answer: format!("answer to {question}"), metadata }
}

fn scripted_engine(entries: Vec<QaEntry>, hits: Vec<(i64, f32)>) -> RetrievalEngine {
    scripted_engine_with(entries, hits, RetrievalOptions::default())
}

fn scripted_engine_with(entries: Vec<QaEntry>, hits: Vec<(i64, f32)>, defaults: RetrievalOptions) -> RetrievalEngine {
    let index = ScriptedIndex { len: entries.len(), hits };
    let kb = KnowledgeBase::new(Catalog::new(entries), Arc::new(index)).expect("aligned");
    RetrievalEngine::new(Arc::new(kb), Arc::new(ConstEmbedder), defaults).expect("engine")
}

fn questions(results: &[faqdesk_core::types::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.question.as_str()).collect()
}

fn four_entries() -> Vec<QaEntry> {
    vec![
        entry("q0", &[("Customer Type", "New"), ("vehicle_type", "SUV")]),
        entry("q1", &[("Customer Type", "Returning"), ("vehicle_type", "Sedan")]),
        entry("q2", &[("Customer Type", "Returning"), ("vehicle_type", "Van")]),
        entry("q3", &[]),
    ]
}

#[test]
fn threshold_is_strict() {
    let hits = vec![(0, 0.5 - 1e-6), (1, 0.5)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("anything", None, 5, 0.5).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q0"], "score equal to the threshold is excluded");
    assert!(out.results[0].similarity_score > 0.5);
}

#[test]
fn similarity_is_one_minus_distance_in_descending_order() {
    let hits = vec![(2, 0.1), (0, 0.25), (1, 0.4), (3, 0.9)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("q", None, 4, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q2", "q0", "q1"]);
    let scores: Vec<f32> = out.results.iter().map(|r| r.similarity_score).collect();
    assert!((scores[0] - 0.9).abs() < 1e-6);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "non-increasing: {scores:?}");
}

#[test]
fn candidates_are_sorted_even_if_the_index_is_not() {
    let hits = vec![(1, 0.4), (0, 0.1), (2, 0.2)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("q", None, 3, 0.0).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q0", "q2", "q1"]);
}

#[test]
fn relaxation_prefers_the_most_specific_tier() {
    let entries = vec![
        entry("both", &[("Customer Type", "Returning"), ("vehicle_type", "SUV")]),
        entry("neither-a", &[("Customer Type", "New"), ("vehicle_type", "Van")]),
        entry("neither-b", &[("Customer Type", "Business"), ("vehicle_type", "Sedan")]),
        entry("neither-c", &[]),
    ];
    let hits = vec![(1, 0.1), (2, 0.15), (0, 0.2), (3, 0.25)];
    let engine = scripted_engine(entries, hits);
    let filters = MetadataFilters::new()
        .with(MetadataField::CustomerType, "Returning")
        .with(MetadataField::VehicleType, "SUV");
    let out = engine.retrieve("q", Some(&filters), 5, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["both"]);
}

#[test]
fn relaxation_drops_trailing_fields_first() {
    let hits = vec![(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)];
    let engine = scripted_engine(four_entries(), hits);
    // No entry is Returning + SUV, so the tier falls back to Returning alone.
    let filters = MetadataFilters::new()
        .with(MetadataField::CustomerType, "Returning")
        .with(MetadataField::VehicleType, "SUV");
    let out = engine.retrieve("q", Some(&filters), 5, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q1", "q2"]);
}

#[test]
fn over_constrained_filters_fall_back_to_unfiltered_candidates() {
    let hits = vec![(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)];
    let engine = scripted_engine(four_entries(), hits);
    let filters = MetadataFilters::new()
        .with(MetadataField::CustomerType, "returning")
        .with(MetadataField::DeliveryLocation, "Moon");
    let filtered = engine.retrieve("q", Some(&filters), 5, 0.3).expect("filtered");
    let unfiltered = engine.retrieve("q", None, 5, 0.3).expect("unfiltered");
    assert_eq!(filtered, unfiltered);
    assert_eq!(filtered.results.len(), 4);
}

#[test]
fn no_filters_passes_candidates_through() {
    let hits = vec![(3, 0.05), (0, 0.1), (2, 0.8)];
    let engine = scripted_engine(four_entries(), hits);
    let none = engine.retrieve("q", None, 5, 0.3).expect("none");
    let empty = engine.retrieve("q", Some(&MetadataFilters::new()), 5, 0.3).expect("empty");
    assert_eq!(questions(&none.results), vec!["q3", "q0"]);
    assert_eq!(none, empty, "empty filters behave like no filters");
}

#[test]
fn nothing_above_threshold_is_an_empty_result_not_an_error() {
    let hits = vec![(0, 0.75), (1, 0.9)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("q", None, 5, 0.3).expect("no error");
    assert!(out.is_empty());
    assert!(!out.is_degraded());
}

#[test]
fn out_of_range_ids_are_skipped_and_reported() {
    let hits = vec![(1, 0.1), (99, 0.15), (0, 0.2), (-1, f32::INFINITY)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("q", None, 5, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q1", "q0"]);
    assert_eq!(out.faults, vec![IntegrityFault { id: 99, catalog_len: 4 }]);
    assert!(out.is_degraded(), "a fault is distinguishable from no match");
}

#[test]
fn only_out_of_range_hits_is_degraded_and_empty() {
    let engine = scripted_engine(four_entries(), vec![(7, 0.0)]);
    let out = engine.retrieve("q", None, 5, 0.3).expect("retrieve");
    assert!(out.is_empty());
    assert!(out.is_degraded());
}

#[test]
fn strict_fields_discard_candidates_before_relaxation() {
    let defaults = RetrievalOptions { strict_fields: vec![MetadataField::VehicleType], ..Default::default() };
    let hits = vec![(0, 0.1), (1, 0.2), (2, 0.3)];
    let engine = scripted_engine_with(four_entries(), hits, defaults);

    let filters = MetadataFilters::new()
        .with(MetadataField::CustomerType, "Returning")
        .with(MetadataField::VehicleType, "Van");
    let out = engine.retrieve("q", Some(&filters), 5, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q2"]);

    let no_match = MetadataFilters::new().with(MetadataField::VehicleType, "Truck");
    let out = engine.retrieve("q", Some(&no_match), 5, 0.3).expect("retrieve");
    assert!(out.is_empty(), "strict mismatch is never relaxed away");

    let out = engine.retrieve("q", None, 5, 0.3).expect("retrieve");
    assert_eq!(out.results.len(), 3, "strict fields need a filter value to apply");
}

#[test]
fn k_limits_the_candidate_pool() {
    let hits = vec![(0, 0.1), (1, 0.2), (2, 0.3)];
    let engine = scripted_engine(four_entries(), hits);
    let out = engine.retrieve("q", None, 2, 0.3).expect("retrieve");
    assert_eq!(questions(&out.results), vec!["q0", "q1"]);
}

#[test]
fn invalid_inputs_are_rejected() {
    let engine = scripted_engine(four_entries(), vec![(0, 0.1)]);
    assert!(matches!(engine.retrieve("q", None, 0, 0.3), Err(RetrievalError::InvalidInput(_))));
    assert!(matches!(engine.retrieve("q", None, 5, f32::NAN), Err(RetrievalError::InvalidInput(_))));
}

#[test]
fn knowledge_base_rejects_misaligned_index() {
    let index = ScriptedIndex { len: 3, hits: vec![] };
    assert!(KnowledgeBase::new(Catalog::new(four_entries()), Arc::new(index)).is_err());
}

#[test]
fn engine_rejects_dimension_mismatch() {
    let index = ScriptedIndex { len: 4, hits: vec![] };
    let kb = KnowledgeBase::new(Catalog::new(four_entries()), Arc::new(index)).expect("aligned");
    let result = RetrievalEngine::new(Arc::new(kb), Arc::new(FakeEmbedder::new(8)), RetrievalOptions::default());
    assert!(matches!(result, Err(RetrievalError::InvalidConfig(_))));
}

fn flat_engine() -> RetrievalEngine {
    let entries = vec![
        entry("How do I extend my trip", &[("vehicle_type", "SUV"), ("delivery_location", "Airport")]),
        entry("Can I extend my trip by a day", &[("vehicle_type", "Sedan"), ("delivery_location", "Airport")]),
        entry("Where do I return the car keys", &[("vehicle_type", "SUV")]),
        entry("Is there a fee for late return", &[]),
    ];
    let catalog = Catalog::new(entries);
    let embedder = FakeEmbedder::new(128);
    let embeddings = embed_catalog(&catalog, &embedder, 2).expect("embed");
    let index = FlatIndex::build(128, DistanceMetric::Cosine, &embeddings).expect("index");
    let kb = KnowledgeBase::new(catalog, Arc::new(index)).expect("aligned");
    RetrievalEngine::new(Arc::new(kb), Arc::new(embedder), RetrievalOptions::default()).expect("engine")
}

#[test]
fn end_to_end_with_flat_index_and_filters() {
    let engine = flat_engine();
    let unfiltered = engine.retrieve_default("extend my trip", None).expect("retrieve");
    let top: Vec<&str> = questions(&unfiltered.results);
    assert!(top.len() >= 2, "{top:?}");
    assert!(top[..2].contains(&"How do I extend my trip"));
    assert!(top[..2].contains(&"Can I extend my trip by a day"));

    let filters = MetadataFilters::new()
        .with(MetadataField::VehicleType, "Sedan")
        .with(MetadataField::DeliveryLocation, "Airport");
    let filtered = engine.retrieve_default("extend my trip", Some(&filters)).expect("retrieve");
    assert_eq!(questions(&filtered.results), vec!["Can I extend my trip by a day"]);
}

#[test]
fn empty_query_is_searched_without_error() {
    let engine = flat_engine();
    let out = engine.retrieve_default("", None).expect("empty query");
    assert!(out.is_empty());
    assert!(!out.is_degraded());
}

#[test]
fn identical_calls_return_identical_results() {
    let engine = flat_engine();
    let filters = MetadataFilters::new().with(MetadataField::VehicleType, "SUV");
    let a = engine.retrieve("late return of the car", Some(&filters), 4, 0.1).expect("a");
    let b = engine.retrieve("late return of the car", Some(&filters), 4, 0.1).expect("b");
    assert_eq!(a, b);
}

#[test]
fn concurrent_calls_agree() {
    let engine = Arc::new(flat_engine());
    let expected = engine.retrieve_default("extend my trip", None).expect("baseline");
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                s.spawn(move || engine.retrieve_default("extend my trip", None).expect("thread"))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("join"), expected);
        }
    });
}

#[test]
fn k_far_beyond_the_catalog_is_capped() {
    let engine = flat_engine();
    let capped = engine.retrieve("extend my trip", None, usize::MAX, 0.3).expect("huge k");
    let exact = engine.retrieve("extend my trip", None, 4, 0.3).expect("k = catalog size");
    assert_eq!(capped, exact);
    assert!(!capped.is_degraded());
}
