//! Domain types shared by the encoder, the vector index, the retrieval engine
//! and the conversation layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Free-form metadata attached to a catalog entry, keyed by attribute name.
pub type Meta = HashMap<String, String>;

/// One question/answer pair of the FAQ catalog.
///
/// Entry `i` of a catalog corresponds to vector id `i` of the index built from
/// it; see `Catalog` for the alignment rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: Meta,
}

/// The reservation attributes that FAQ entries can be filtered on.
///
/// The declaration order is the canonical relaxation order: when filters are
/// derived from a reservation, the last field is the first one dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetadataField {
    #[serde(rename = "Customer Type")]
    CustomerType,
    #[serde(rename = "vehicle_type")]
    VehicleType,
    #[serde(rename = "delivery_location")]
    DeliveryLocation,
    #[serde(rename = "delivery_location_category")]
    DeliveryLocationCategory,
    #[serde(rename = "Car Product Type")]
    CarProductType,
}

impl MetadataField {
    pub const ALL: [MetadataField; 5] = [
        MetadataField::CustomerType,
        MetadataField::VehicleType,
        MetadataField::DeliveryLocation,
        MetadataField::DeliveryLocationCategory,
        MetadataField::CarProductType,
    ];

    /// Key under which this attribute is stored in catalog metadata.
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::CustomerType => "Customer Type",
            MetadataField::VehicleType => "vehicle_type",
            MetadataField::DeliveryLocation => "delivery_location",
            MetadataField::DeliveryLocationCategory => "delivery_location_category",
            MetadataField::CarProductType => "Car Product Type",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered per-query metadata constraints.
///
/// Insertion order matters: relaxation keeps the leading fields longest.
/// Empty values mean "unconstrained" and are never stored, and inserting a
/// field twice replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilters {
    fields: Vec<(MetadataField, String)>,
}

impl MetadataFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.retain(|(f, _)| *f != field);
            return;
        }
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Parse filters from untyped key/value pairs, keeping their order.
    ///
    /// Unknown keys are rejected; empty values are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filters = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let field = MetadataField::from_key(key)
                .ok_or_else(|| Error::InvalidInput(format!("unknown metadata filter field '{key}'")))?;
            filters.insert(field, value);
        }
        Ok(filters)
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = MetadataField> + '_ {
        self.fields.iter().map(|(f, _)| *f)
    }

    /// True when `meta` carries exactly the filter value for every field in
    /// `fields`. Comparison is case-sensitive; a missing key never matches.
    pub fn matches_on(&self, meta: &Meta, fields: &[MetadataField]) -> bool {
        fields.iter().all(|field| match (self.get(*field), meta.get(field.key())) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => false,
        })
    }
}

/// Distance function used by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `‖q − v‖²`
    #[default]
    SquaredL2,
    /// `1 − cos(q, v)`
    Cosine,
}

/// Raw nearest-neighbour output: parallel arrays sorted by ascending distance.
///
/// Slots the index could not fill carry id `-1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    pub distances: Vec<f32>,
    pub ids: Vec<i64>,
}

impl Neighbors {
    pub const PADDING_ID: i64 = -1;

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(id, distance)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f32)> + '_ {
        self.ids.iter().copied().zip(self.distances.iter().copied())
    }
}

/// A catalog entry returned for a query, with its similarity score.
///
/// `similarity_score` is `1 − distance`; 1 is a perfect match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub question: String,
    pub answer: String,
    pub metadata: Meta,
    pub similarity_score: f32,
}
