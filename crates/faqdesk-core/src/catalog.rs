//! The ordered FAQ catalog.
//!
//! Position is identity: entry `i` pairs with row `i` of the embedding matrix
//! and vector id `i` of the index. Anything that reorders or filters entries
//! must rebuild the embeddings as well.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::QaEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<QaEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<QaEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON array of `{question, answer, metadata}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read QA catalog {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse QA catalog {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let entries: Vec<QaEntry> = serde_json::from_str(raw)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by vector id. Negative or out-of-range ids yield `None`.
    pub fn get(&self, id: i64) -> Option<&QaEntry> {
        usize::try_from(id).ok().and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    /// The texts that get embedded, in catalog order.
    pub fn questions(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.question.clone()).collect()
    }
}

impl From<Vec<QaEntry>> for Catalog {
    fn from(entries: Vec<QaEntry>) -> Self {
        Self::new(entries)
    }
}
