use crate::config::OutputConfig;
use crate::error::Result;
use crate::processor::ProcessedRecord;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;

pub mod archive;
pub mod console;
pub mod csv;
pub mod json;
pub mod sqlite;

/// Destination for the records of one processing run.
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&mut self, url: &str, record: &ProcessedRecord) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens the configured output, defaulting to the console.
pub async fn create_output(
    config: Option<&OutputConfig>,
    multi: Option<Arc<MultiProgress>>,
) -> Result<Box<dyn OutputHandler>> {
    let handler: Box<dyn OutputHandler> = match config {
        None | Some(OutputConfig::Console) => Box::new(console::ConsoleOutput::new(multi)),
        Some(OutputConfig::Json { path }) => Box::new(json::JsonOutput::new(PathBuf::from(path))?),
        Some(OutputConfig::Csv { path }) => Box::new(csv::CsvOutput::new(PathBuf::from(path))?),
        Some(OutputConfig::Sqlite { path, table }) => {
            Box::new(sqlite::SqliteOutput::new(PathBuf::from(path), table.clone()).await?)
        }
    };
    Ok(handler)
}
