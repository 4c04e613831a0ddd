//! Read-only reservation records and the lookup table built from them.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::{MetadataField, MetadataFilters};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub trip_start: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub trip_end: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub trip_duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vehicle_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_location_category: String,
    #[serde(rename = "Car Product Type", default, deserialize_with = "lenient_string")]
    pub car_product_type: String,
    #[serde(rename = "Customer Type", default, deserialize_with = "lenient_string")]
    pub customer_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: String,
    #[serde(default)]
    pub messages: Vec<ReservationMessage>,
}

impl Reservation {
    pub fn value(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::CustomerType => &self.customer_type,
            MetadataField::VehicleType => &self.vehicle_type,
            MetadataField::DeliveryLocation => &self.delivery_location,
            MetadataField::DeliveryLocationCategory => &self.delivery_location_category,
            MetadataField::CarProductType => &self.car_product_type,
        }
    }

    /// Filters in canonical field order; blank attributes are left unconstrained.
    pub fn metadata_filters(&self) -> MetadataFilters {
        MetadataField::ALL
            .into_iter()
            .fold(MetadataFilters::new(), |filters, field| filters.with(field, self.value(field)))
    }

    /// The last `n` historical messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> &[ReservationMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

/// Reservations keyed by id. Built once at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ReservationBook {
    by_id: HashMap<i64, Reservation>,
}

impl ReservationBook {
    /// On duplicate ids the first record wins.
    pub fn new(reservations: Vec<Reservation>) -> Self {
        let mut by_id = HashMap::with_capacity(reservations.len());
        for r in reservations {
            by_id.entry(r.reservation_id).or_insert(r);
        }
        Self { by_id }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read reservations {}", path.display()))?;
        let reservations: Vec<Reservation> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse reservations {}", path.display()))?;
        Ok(Self::new(reservations))
    }

    pub fn get(&self, reservation_id: i64) -> Option<&Reservation> {
        self.by_id.get(&reservation_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// Source exports mix strings, numbers and nulls for the same column.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
