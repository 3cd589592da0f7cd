use anyhow::{Context, Result};
use directories::ProjectDirs;
use kioku_core::{CollectionRegistry, RegistryConfig, MAX_PAGE_SIZE};
use kioku_notion::{NotionConfig, DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notion_token: Option<String>,
    pub notion_version: String,
    pub notion_base_url: String,
    pub http_timeout_secs: u64,
    pub page_size: u32,
    pub registry_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            notion_token: std::env::var("NOTION_TOKEN")
                .or_else(|_| std::env::var("NOTION_INTEGRATION_SECRET"))
                .ok()
                .filter(|t| !t.trim().is_empty()),
            notion_version: std::env::var("NOTION_VERSION")
                .unwrap_or_else(|_| DEFAULT_NOTION_VERSION.to_string()),
            notion_base_url: std::env::var("NOTION_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            http_timeout_secs: std::env::var("KIOKU_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            page_size: std::env::var("KIOKU_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_PAGE_SIZE),
            registry_path: std::env::var("KIOKU_REGISTRY").ok().map(PathBuf::from),
        }
    }

    pub fn notion(&self) -> Result<NotionConfig> {
        let token = self
            .notion_token
            .clone()
            .context("NOTION_TOKEN is not set (use --store memory for the demo deck)")?;
        Ok(NotionConfig {
            token,
            base_url: self.notion_base_url.clone(),
            version: self.notion_version.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
        })
    }

    /// `--registry`, then `KIOKU_REGISTRY`, then the per-user config file, then the builtin table.
    pub fn load_registry(&self, flag: Option<&Path>) -> Result<CollectionRegistry> {
        let path = flag
            .map(Path::to_path_buf)
            .or_else(|| self.registry_path.clone())
            .or_else(|| default_registry_file().filter(|p| p.exists()));
        let config = match path {
            Some(p) => {
                let data = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading registry {}", p.display()))?;
                info!(path = %p.display(), "loaded registry");
                RegistryConfig::from_json(&data)?
            }
            None => RegistryConfig::builtin(),
        };
        Ok(CollectionRegistry::new(config)?)
    }
}

pub fn default_registry_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "kioku", "Kioku").map(|pd| pd.config_dir().join("registry.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kioku_core::CardKind;
    use std::io::Write;

    fn bare() -> AppConfig {
        AppConfig {
            notion_token: None,
            notion_version: DEFAULT_NOTION_VERSION.into(),
            notion_base_url: DEFAULT_BASE_URL.into(),
            http_timeout_secs: 30,
            page_size: 100,
            registry_path: None,
        }
    }

    #[test]
    fn notion_requires_a_token() {
        assert!(bare().notion().is_err());
        let mut c = bare();
        c.notion_token = Some("secret".into());
        let n = c.notion().unwrap();
        assert_eq!(n.timeout, Duration::from_secs(30));
        assert_eq!(n.version, "2022-06-28");
    }

    #[test]
    fn registry_flag_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "vocabulary": { "default_level": "A", "levels": { "A": { "collection": "a" } } },
                "grammar": { "default_level": "B", "levels": { "B": { "collection": "b" } } },
                "expression": { "default_level": "C", "levels": { "C": { "collection": "c" } } }
            }"#,
        )
        .unwrap();
        let registry = bare().load_registry(Some(file.path())).unwrap();
        assert_eq!(registry.levels(CardKind::Vocabulary), vec!["A"]);
        assert_eq!(registry.resolve(CardKind::Grammar, None).collection.as_str(), "b");
    }

    #[test]
    fn missing_registry_file_is_an_error() {
        let err = bare().load_registry(Some(Path::new("/nonexistent/kioku.json")));
        assert!(err.is_err());
    }
}
