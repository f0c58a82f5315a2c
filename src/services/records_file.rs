use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::ports::records::RecordSource;
use crate::services::highlights::types::Record;

#[derive(Debug, Deserialize)]
struct RecordsDocument {
    #[serde(default)]
    record_of_the_week: String,
    #[serde(default)]
    records: Vec<Record>,
}

/// Reads the weekly records from a JSON file written by the review crawler.
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<RecordsDocument> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .wrap_err(format!("Failed to read records file: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .wrap_err(format!("Failed to parse records file: {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl RecordSource for JsonRecordSource {
    async fn weekly_records(&self) -> Result<Vec<Record>> {
        let mut records = self.read_document().await?.records;
        records.sort_by(|a, b| a.band.cmp(&b.band));
        Ok(records)
    }

    async fn record_of_the_week_band(&self) -> Result<String> {
        Ok(self.read_document().await?.record_of_the_week.trim().to_string())
    }
}
