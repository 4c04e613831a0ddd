//! LanceDB persistence for the catalog and its embedding matrix.
//!
//! Entries and vectors live in the same table so they cannot drift apart: a
//! write always replaces every row, and a load refuses tables whose `row`
//! column is not exactly `0..n`.

use anyhow::{anyhow, bail, Result};
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::database::CreateTableMode;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::sync::Arc;

use faqdesk_core::catalog::Catalog;
use faqdesk_core::types::{DistanceMetric, Meta, QaEntry};

use crate::flat::FlatIndex;
use crate::schema::build_faq_schema;

const WRITE_BATCH_ROWS: usize = 1000;

pub struct FaqStore {
    db: Connection,
    table_name: String,
}

impl FaqStore {
    pub async fn open(uri: &str, table_name: &str) -> Result<Self> {
        let db = connect(uri).execute().await?;
        Ok(Self { db, table_name: table_name.to_string() })
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.table_name))
    }

    /// Replace the stored catalog and embeddings. Returns the number of rows written.
    pub async fn write(&self, catalog: &Catalog, embeddings: &[Vec<f32>]) -> Result<usize> {
        if catalog.len() != embeddings.len() {
            bail!("catalog has {} entries but {} embeddings were supplied", catalog.len(), embeddings.len());
        }
        let Some(dim) = embeddings.first().map(Vec::len) else {
            bail!("refusing to write an empty catalog");
        };
        if let Some((row, v)) = embeddings.iter().enumerate().find(|(_, v)| v.len() != dim) {
            bail!("embedding row {} has dimension {}, expected {}", row, v.len(), dim);
        }
        let dim = i32::try_from(dim)?;
        let schema = build_faq_schema(dim);

        let mut batches = Vec::new();
        for start in (0..catalog.len()).step_by(WRITE_BATCH_ROWS) {
            let end = (start + WRITE_BATCH_ROWS).min(catalog.len());
            batches.push(Ok(rows_to_record_batch(catalog.entries(), embeddings, start, end, dim)?));
        }
        let reader = Box::new(RecordBatchIterator::new(batches.into_iter(), schema));

        // Overwrite swaps the schema too, so a new embedding dimension is fine.
        self.db
            .create_table(&self.table_name, reader)
            .mode(CreateTableMode::Overwrite)
            .execute()
            .await?;
        tracing::info!(table = %self.table_name, rows = catalog.len(), dim, "faq store written");
        Ok(catalog.len())
    }

    /// Read the catalog and its embedding matrix back in row order.
    pub async fn load(&self) -> Result<(Catalog, Vec<Vec<f32>>)> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let total = table.count_rows(None).await?;
        let mut rows: Vec<(i32, QaEntry, Vec<f32>)> = Vec::with_capacity(total);
        if total > 0 {
            let mut stream = table.query().limit(total).execute().await?;
            while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
                read_batch(&batch, &mut rows)?;
            }
        }
        rows.sort_by_key(|(row, _, _)| *row);

        let mut entries = Vec::with_capacity(rows.len());
        let mut embeddings = Vec::with_capacity(rows.len());
        for (expected, (row, entry, vector)) in rows.into_iter().enumerate() {
            if usize::try_from(row).ok() != Some(expected) {
                bail!("faq store '{}' is misaligned: expected row {}, found {}", self.table_name, expected, row);
            }
            if let Some(first) = embeddings.first().map(Vec::len) {
                if vector.len() != first {
                    bail!("faq store row {} has dimension {}, expected {}", row, vector.len(), first);
                }
            }
            entries.push(entry);
            embeddings.push(vector);
        }
        tracing::info!(table = %self.table_name, rows = entries.len(), "faq store loaded");
        Ok((Catalog::new(entries), embeddings))
    }

    /// Load the catalog together with an exact index over its vectors.
    pub async fn load_index(&self, metric: DistanceMetric) -> Result<(Catalog, FlatIndex)> {
        let (catalog, embeddings) = self.load().await?;
        let dim = embeddings.first().map(Vec::len).ok_or_else(|| anyhow!("faq store '{}' is empty", self.table_name))?;
        let index = FlatIndex::build(dim, metric, &embeddings)?;
        Ok((catalog, index))
    }
}

fn rows_to_record_batch(entries: &[QaEntry], embeddings: &[Vec<f32>], start: usize, end: usize, dim: i32) -> Result<RecordBatch> {
    let mut rows = Vec::with_capacity(end - start);
    let mut questions = Vec::with_capacity(end - start);
    let mut answers = Vec::with_capacity(end - start);
    let mut metadata = Vec::with_capacity(end - start);
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(end - start);
    for i in start..end {
        let entry = &entries[i];
        rows.push(i32::try_from(i)?);
        questions.push(entry.question.clone());
        answers.push(entry.answer.clone());
        metadata.push(serde_json::to_string(&entry.metadata)?);
        vectors.push(Some(embeddings[i].iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(build_faq_schema(dim), vec![
        Arc::new(Int32Array::from(rows)),
        Arc::new(StringArray::from(questions)),
        Arc::new(StringArray::from(answers)),
        Arc::new(StringArray::from(metadata)),
        Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
    ])?;
    Ok(record_batch)
}

fn read_batch(batch: &RecordBatch, out: &mut Vec<(i32, QaEntry, Vec<f32>)>) -> Result<()> {
    let row_col = batch
        .column_by_name("row")
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| anyhow!("row column missing"))?;
    let question_col = string_column(batch, "question")?;
    let answer_col = string_column(batch, "answer")?;
    let metadata_col = string_column(batch, "metadata")?;
    let vector_col = batch
        .column_by_name("vector")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| anyhow!("vector column missing"))?;
    for i in 0..batch.num_rows() {
        let row = row_col.value(i);
        if vector_col.is_null(i) {
            bail!("faq store row {} has no vector", row);
        }
        let metadata: Meta = serde_json::from_str(metadata_col.value(i))?;
        let list = vector_col.value(i);
        let vector = list.as_primitive::<arrow_array::types::Float32Type>().values().to_vec();
        let entry = QaEntry {
            question: question_col.value(i).to_string(),
            answer: answer_col.value(i).to_string(),
            metadata,
        };
        out.push((row, entry, vector));
    }
    Ok(())
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{} column missing", name))
}
