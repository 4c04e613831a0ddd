use faqdesk_core::config::EmbeddingSettings;
use faqdesk_core::traits::Embedder;
use faqdesk_embed::{get_default_embedder, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { fake: true, fake_dim: 64, ..Default::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64);
    assert_eq!(embedder.dim(), 64);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_ranks_shared_tokens_closer() {
    let embedder = FakeEmbedder::new(256);
    let query = embedder.embed("How do I extend my trip?").expect("query");
    let near = embedder.embed("Can I extend my trip").expect("near");
    let far = embedder.embed("Where is the fuel cap located").expect("far");
    assert!(cosine(&query, &near) > cosine(&query, &far));
}

#[test]
fn fake_embedder_handles_empty_text() {
    let embedder = FakeEmbedder::new(16);
    let v = embedder.embed("").expect("empty");
    assert_eq!(v.len(), 16);
    assert!(v.iter().all(|x| *x == 0.0));
    assert!(embedder.embed_batch(&[]).expect("batch").is_empty());
}

#[test]
fn safetensors_weights_load_from_model_dir() {
    use candle_core::{Device, Tensor};
    use std::collections::HashMap;

    let tmp = tempfile::TempDir::new().unwrap();
    let w = Tensor::new(&[[1f32, 2.0], [3.0, 4.0]], &Device::Cpu).unwrap();
    let tensors: HashMap<String, Tensor> = [("layer.weight".to_string(), w)].into_iter().collect();
    candle_core::safetensors::save(&tensors, tmp.path().join("model.safetensors")).unwrap();

    let vb = faqdesk_embed::load_weights(tmp.path(), &Device::Cpu).expect("weights");
    let loaded = vb.get((2, 2), "layer.weight").unwrap();
    assert_eq!(loaded.to_vec2::<f32>().unwrap(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
}

#[test]
fn missing_weights_are_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    assert!(faqdesk_embed::load_weights(tmp.path(), &candle_core::Device::Cpu).is_err());
}
