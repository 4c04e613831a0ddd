use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per catalog entry. `row` is the entry's catalog position and its
/// vector id; `metadata` is the entry's metadata map as a JSON object.
pub fn build_faq_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("row", DataType::Int32, false),
        Field::new("question", DataType::Utf8, false),
        Field::new("answer", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
