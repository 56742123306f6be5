use crate::config::schema::{
    PipelineConfig, default_fetch_concurrency, default_timeout_ms, default_user_agent,
};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        Self::load_with_inheritance(path, &mut visited, false)
    }

    /// Checks a configuration that did not come from a file.
    pub fn validate(config: &PipelineConfig) -> Result<()> {
        config.validate()?;
        Self::check_urls(&config.urls)
    }

    fn load_with_inheritance(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        is_parent_load: bool,
    ) -> Result<PipelineConfig> {
        let path = fs::canonicalize(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if visited.contains(&path) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }
        visited.insert(path.clone());

        let config = Self::load_file(&path)?;

        let final_config = if let Some(parent_path_str) = &config.extends {
            let parent_path = path
                .parent()
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Cannot determine parent directory for {}",
                        path.display()
                    ))
                })?
                .join(parent_path_str);

            let parent_config = Self::load_with_inheritance(&parent_path, visited, true)?;
            Self::merge_configs(parent_config, config)
        } else {
            config
        };

        if !is_parent_load {
            Self::validate(&final_config)?;
        }

        Ok(final_config)
    }

    fn load_file(path: &Path) -> Result<PipelineConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn check_urls(urls: &[String]) -> Result<()> {
        for raw in urls {
            let parsed = Url::parse(raw)
                .map_err(|e| Error::Config(format!("Invalid URL '{}': {}", raw, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Unsupported URL scheme '{}' in {}",
                    parsed.scheme(),
                    raw
                )));
            }
        }
        Ok(())
    }

    fn merge_configs(mut parent: PipelineConfig, child: PipelineConfig) -> PipelineConfig {
        if !child.name.is_empty() {
            parent.name = child.name;
        }
        if !child.urls.is_empty() {
            parent.urls = child.urls;
        }
        if child.fetch.concurrency != default_fetch_concurrency() {
            parent.fetch.concurrency = child.fetch.concurrency;
        }
        if child.fetch.timeout_ms != default_timeout_ms() {
            parent.fetch.timeout_ms = child.fetch.timeout_ms;
        }
        if child.fetch.user_agent != default_user_agent() {
            parent.fetch.user_agent = child.fetch.user_agent;
        }
        if child.process.concurrency.is_some() {
            parent.process.concurrency = child.process.concurrency;
        }
        if child.output.is_some() {
            parent.output = child.output;
        }
        if child.save_dir.is_some() {
            parent.save_dir = child.save_dir;
        }

        parent.extends = None;
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OutputConfig;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "batch.toml",
            r#"
name = "docs"
urls = ["https://example.com", "http://example.org/a"]
"#,
        );

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.name, "docs");
        assert_eq!(config.urls.len(), 2);
        assert_eq!(config.fetch.concurrency, 3);
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.process.concurrency, None);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_load_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let json = write_file(
            &dir,
            "batch.json",
            r#"{"name": "j", "urls": ["https://example.com"],
                "fetch": {"concurrency": 5}, "output": {"type": "csv", "path": "out.csv"}}"#,
        );
        let yaml = write_file(
            &dir,
            "batch.yaml",
            "name: y\nurls:\n  - https://example.com\nprocess:\n  concurrency: 2\n",
        );

        let config = ConfigLoader::load(&json).unwrap();
        assert_eq!(config.fetch.concurrency, 5);
        assert_eq!(
            config.output,
            Some(OutputConfig::Csv {
                path: "out.csv".to_string()
            })
        );

        let config = ConfigLoader::load(&yaml).unwrap();
        assert_eq!(config.process.concurrency, Some(2));
    }

    #[test]
    fn test_inheritance_merges_child_over_parent() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "base.toml",
            r#"
name = "base"
urls = ["https://example.com"]
save_dir = "pages"

[fetch]
concurrency = 8
timeout_ms = 1000
"#,
        );
        let child = write_file(
            &dir,
            "child.toml",
            r#"
extends = "base.toml"
name = "child"

[fetch]
timeout_ms = 2500
"#,
        );

        let config = ConfigLoader::load(&child).unwrap();
        assert_eq!(config.name, "child");
        assert_eq!(config.urls, vec!["https://example.com".to_string()]);
        assert_eq!(config.fetch.concurrency, 8);
        assert_eq!(config.fetch.timeout_ms, 2500);
        assert_eq!(config.save_dir.as_deref(), Some("pages"));
        assert!(config.extends.is_none());
    }

    #[test]
    fn test_circular_inheritance_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.toml", "extends = \"b.toml\"\nname = \"a\"\n");
        let b = write_file(&dir, "b.toml", "extends = \"a.toml\"\nname = \"b\"\n");

        match ConfigLoader::load(&b) {
            Err(Error::Config(message)) => assert!(message.contains("Circular")),
            other => panic!("expected circular inheritance error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_configs() {
        let dir = TempDir::new().unwrap();
        let zero = write_file(
            &dir,
            "zero.toml",
            "name = \"z\"\nurls = [\"https://example.com\"]\n[fetch]\nconcurrency = 0\n",
        );
        assert!(matches!(ConfigLoader::load(&zero), Err(Error::Validation(_))));

        let no_urls = write_file(&dir, "empty.toml", "name = \"e\"\n");
        assert!(matches!(ConfigLoader::load(&no_urls), Err(Error::Validation(_))));

        let bad_url = write_file(&dir, "bad.toml", "name = \"b\"\nurls = [\"ftp://example.com\"]\n");
        assert!(matches!(ConfigLoader::load(&bad_url), Err(Error::Config(_))));

        let ini = write_file(&dir, "batch.ini", "name = x\n");
        assert!(matches!(ConfigLoader::load(&ini), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.urls.len(), 5);
        ConfigLoader::validate(&config).unwrap();
    }
}
