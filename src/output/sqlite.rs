use super::OutputHandler;
use crate::error::{Error, Result};
use crate::processor::ProcessedRecord;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::path::PathBuf;

/// Stores pages in a SQLite table; `links` is kept as a JSON array.
pub struct SqliteOutput {
    pool: SqlitePool,
    table_name: String,
    initialized: bool,
}

impl SqliteOutput {
    pub async fn new(path: PathBuf, table_name: String) -> Result<Self> {
        if table_name.is_empty()
            || !table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Config(format!("Invalid table name: {:?}", table_name)));
        }

        let conn_str = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&conn_str).await?;

        Ok(Self {
            pool,
            table_name,
            initialized: false,
        })
    }

    async fn ensure_table(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let query = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                links TEXT NOT NULL,
                text_content TEXT NOT NULL
            )",
            self.table_name
        );
        sqlx::query(&query).execute(&self.pool).await?;

        self.initialized = true;
        Ok(())
    }
}

#[async_trait]
impl OutputHandler for SqliteOutput {
    async fn write(&mut self, url: &str, record: &ProcessedRecord) -> Result<()> {
        self.ensure_table().await?;

        let query = format!(
            "INSERT INTO {} (url, title, links, text_content) VALUES (?1, ?2, ?3, ?4)",
            self.table_name
        );
        sqlx::query(&query)
            .bind(url)
            .bind(&record.title)
            .bind(serde_json::to_string(&record.links)?)
            .bind(&record.text_content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
