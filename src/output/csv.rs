use super::OutputHandler;
use crate::error::{Error, Result};
use crate::processor::ProcessedRecord;
use async_trait::async_trait;
use std::path::PathBuf;

const HEADERS: [&str; 5] = ["url", "title", "link_count", "links", "text_content"];

/// One row per page; links are space separated.
pub struct CsvOutput {
    writer: csv::Writer<std::fs::File>,
    headers_written: bool,
}

impl CsvOutput {
    pub fn new(path: PathBuf) -> Result<Self> {
        let writer = csv::Writer::from_path(path).map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self {
            writer,
            headers_written: false,
        })
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn write(&mut self, url: &str, record: &ProcessedRecord) -> Result<()> {
        if !self.headers_written {
            self.writer
                .write_record(HEADERS)
                .map_err(|e| Error::Internal(e.to_string()))?;
            self.headers_written = true;
        }

        let link_count = record.links.len().to_string();
        let links = record.links.join(" ");
        self.writer
            .write_record([
                url,
                record.title.as_str(),
                link_count.as_str(),
                links.as_str(),
                record.text_content.as_str(),
            ])
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
