use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_START_MARKER: &str = "<!-- BLOG-POST-LIST:START -->";
pub const DEFAULT_END_MARKER: &str = "<!-- BLOG-POST-LIST:END -->";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub feed_url: String,
    /// Document whose marker region is rewritten
    #[serde(default = "default_document")]
    pub document: PathBuf,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Summary length in characters, before the ellipsis
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
    /// Fetch timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_start_marker")]
    pub start_marker: String,
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
}

fn default_document() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_max_entries() -> usize {
    5
}

fn default_max_summary_chars() -> usize {
    150
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("blog-post-sync/{}", env!("CARGO_PKG_VERSION"))
}

fn default_start_marker() -> String {
    DEFAULT_START_MARKER.to_string()
}

fn default_end_marker() -> String {
    DEFAULT_END_MARKER.to_string()
}

impl Config {
    /// Config for `feed_url` with every other field at its default.
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            document: default_document(),
            max_entries: default_max_entries(),
            max_summary_chars: default_max_summary_chars(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed_url.trim().is_empty() {
            anyhow::bail!("feed_url must not be empty");
        }
        if self.start_marker.is_empty() || self.end_marker.is_empty() {
            anyhow::bail!("start_marker and end_marker must not be empty");
        }
        if self.start_marker == self.end_marker {
            anyhow::bail!("start_marker and end_marker must differ");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        assert_eq!(default_max_entries(), 5);
        assert_eq!(default_max_summary_chars(), 150);
        assert_eq!(default_timeout_secs(), 10);
        assert!(default_user_agent().starts_with("blog-post-sync/"));
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            feed_url = "https://blog.example.com/index.xml"
            document = "profile/README.md"
            max_entries = 3
            max_summary_chars = 80
            timeout_secs = 20
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.feed_url, "https://blog.example.com/index.xml");
        assert_eq!(config.document, PathBuf::from("profile/README.md"));
        assert_eq!(config.max_entries, 3);
        assert_eq!(config.max_summary_chars, 80);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.start_marker, DEFAULT_START_MARKER);
        assert_eq!(config.end_marker, DEFAULT_END_MARKER);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config = Config::from_str(r#"feed_url = "https://example.com/feed""#).unwrap();

        assert_eq!(config, Config::new("https://example.com/feed"));
        assert_eq!(config.document, PathBuf::from("README.md"));
    }

    #[test]
    fn test_custom_markers() {
        let content = r#"
            feed_url = "https://example.com/feed"
            start_marker = "<!-- posts -->"
            end_marker = "<!-- /posts -->"
        "#;

        let config = Config::from_str(content).unwrap();
        assert_eq!(config.start_marker, "<!-- posts -->");
        assert_eq!(config.end_marker, "<!-- /posts -->");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/blog-sync.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"this is not valid toml {{{").unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_feed_url() {
        let result = Config::from_str("max_entries = 4");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new("   ");
        assert!(config.validate().is_err());

        config = Config::new("https://example.com/feed");
        config.end_marker = config.start_marker.clone();
        assert!(config.validate().is_err());

        config = Config::new("https://example.com/feed");
        config.start_marker.clear();
        assert!(config.validate().is_err());

        config = Config::new("https://example.com/feed");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
