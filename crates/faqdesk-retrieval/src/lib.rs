//! faqdesk-retrieval
//!
//! Turns a customer query plus reservation metadata into a ranked list of FAQ
//! entries: embed, nearest-neighbour search, hard similarity threshold, then
//! progressive metadata-filter relaxation.

pub mod engine;
pub mod error;
pub mod knowledge;
pub mod relax;

pub use engine::{Retrieval, RetrievalEngine, RetrievalOptions};
pub use error::{IntegrityFault, RetrievalError};
pub use knowledge::KnowledgeBase;
