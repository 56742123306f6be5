use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub urls: Vec<String>,

    #[serde(default)]
    #[validate]
    pub fetch: FetchSettings,

    #[serde(default)]
    #[validate]
    pub process: ProcessSettings,

    #[serde(default)]
    pub output: Option<OutputConfig>,

    /// Directory the raw fetched bodies are written to, if any.
    #[serde(default)]
    pub save_dir: Option<String>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl Default for PipelineConfig {
    /// The demo batch: a handful of rust-lang.org sites.
    fn default() -> Self {
        Self {
            name: "rust-lang".to_string(),
            urls: vec![
                "https://www.rust-lang.org".to_string(),
                "https://doc.rust-lang.org".to_string(),
                "https://crates.io".to_string(),
                "https://blog.rust-lang.org".to_string(),
                "https://foundation.rust-lang.org".to_string(),
            ],
            fetch: FetchSettings::default(),
            process: ProcessSettings::default(),
            output: None,
            save_dir: None,
            extends: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FetchSettings {
    #[serde(default = "default_fetch_concurrency")]
    #[validate(range(min = 1))]
    pub concurrency: usize,

    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: default_fetch_concurrency(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProcessSettings {
    /// Parsing workers; `None` uses every available CPU.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json {
        path: String,
    },
    Csv {
        path: String,
    },
    Sqlite {
        path: String,
        #[serde(default = "default_table_name")]
        table: String,
    },
}

pub(crate) fn default_fetch_concurrency() -> usize {
    3
}

pub(crate) fn default_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_user_agent() -> String {
    "Concurrent-Scraper/0.1".to_string()
}

fn default_table_name() -> String {
    "pages".to_string()
}
