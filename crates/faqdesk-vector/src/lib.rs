//! faqdesk-vector
//!
//! The exact in-memory `FlatIndex` used at query time, and the LanceDB-backed
//! `FaqStore` that persists the catalog together with its embeddings.

pub mod build;
pub mod flat;
pub mod schema;
pub mod store;

pub use build::{build_store, embed_catalog};
pub use flat::FlatIndex;
pub use store::FaqStore;
