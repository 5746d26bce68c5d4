mod file_config;

pub use file_config::{FeedFileConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub source: Option<String>,
    pub group_id: Option<i64>,
    pub timeout_sec: Option<u64>,
    pub poll_interval_sec: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub feed: FeedSettings,
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub source: String,
    pub group_id: i64,
    pub timeout: Duration,
}

const DEFAULT_SOURCE: &str = "NFJS";
const DEFAULT_TIMEOUT_SEC: u64 = 30;

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let file_feed = file.feed.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("events db path must be specified on the command line or in the config file")
            })?;

        let base_url = file_feed
            .base_url
            .or_else(|| cli.base_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("feed base url must be specified via --base-url or in the config file")
            })?;

        let group_id = file_feed.group_id.or(cli.group_id).ok_or_else(|| {
            anyhow::anyhow!("owning group must be specified via --group-id or in the config file")
        })?;
        if group_id <= 0 {
            bail!("group id must be positive, got {}", group_id);
        }

        let source = file_feed
            .source
            .or_else(|| cli.source.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        let timeout_sec = file_feed
            .timeout_sec
            .or(cli.timeout_sec)
            .unwrap_or(DEFAULT_TIMEOUT_SEC);

        let poll_interval = file
            .poll_interval_sec
            .or(cli.poll_interval_sec)
            .map(Duration::from_secs);

        Ok(AppConfig {
            db_path,
            feed: FeedSettings {
                base_url,
                source,
                group_id,
                timeout: Duration::from_secs(timeout_sec),
            },
            poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/tmp/events.db")),
            base_url: Some("https://cli.example.com".to_string()),
            source: None,
            group_id: Some(1),
            timeout_sec: None,
            poll_interval_sec: None,
        }
    }

    #[test]
    fn cli_alone_resolves_with_defaults() {
        let config = AppConfig::resolve(&cli(), None).unwrap();
        assert_eq!(config.feed.base_url, "https://cli.example.com");
        assert_eq!(config.feed.source, "NFJS");
        assert_eq!(config.feed.timeout, Duration::from_secs(30));
        assert!(config.poll_interval.is_none());
    }

    #[test]
    fn file_values_override_cli() {
        let file: FileConfig = toml::from_str(
            r#"
            [feed]
            base_url = "https://file.example.com"
            source = "SPRINGONE"
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli(), Some(file)).unwrap();
        assert_eq!(config.feed.base_url, "https://file.example.com");
        assert_eq!(config.feed.source, "SPRINGONE");
        assert_eq!(config.db_path, PathBuf::from("/tmp/events.db"));
    }

    #[test]
    fn missing_group_id_is_an_error() {
        let mut cli = cli();
        cli.group_id = None;
        assert!(AppConfig::resolve(&cli, None).is_err());
    }
}
