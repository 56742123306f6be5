use super::OutputHandler;
use crate::error::{Error, Result};
use crate::processor::ProcessedRecord;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::sync::Arc;

/// Prints a one-line summary per page.
pub struct ConsoleOutput {
    multi: Option<Arc<MultiProgress>>,
    pages: usize,
}

impl ConsoleOutput {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi, pages: 0 }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(None)
    }
}

pub(crate) fn summary_line(page: usize, url: &str, record: &ProcessedRecord) -> String {
    format!(
        "Page {} ({}): Title: '{}', {} links found, Content length: {} chars",
        page,
        url,
        record.title,
        record.links.len(),
        record.text_content.chars().count()
    )
}

#[async_trait]
impl OutputHandler for ConsoleOutput {
    async fn write(&mut self, url: &str, record: &ProcessedRecord) -> Result<()> {
        self.pages += 1;
        let line = summary_line(self.pages, url, record);

        if let Some(multi) = &self.multi {
            multi
                .println(line)
                .map_err(|e| Error::Internal(e.to_string()))?;
        } else {
            println!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let record = ProcessedRecord {
            title: "Rust".to_string(),
            links: vec!["/learn".to_string(), "/tools".to_string()],
            text_content: "héllo".to_string(),
        };
        assert_eq!(
            summary_line(2, "https://www.rust-lang.org", &record),
            "Page 2 (https://www.rust-lang.org): Title: 'Rust', 2 links found, Content length: 5 chars"
        );
    }
}
