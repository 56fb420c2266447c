use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::config::Config;

pub const DEFAULT_CONFIG_PATH: &str = "blog-sync.toml";

#[derive(Parser, Debug)]
#[command(name = "blog-post-sync")]
#[command(about = "Inject the latest posts from an RSS/Atom feed into a README", long_about = None)]
pub struct Cli {
    /// TOML config file; optional when --feed-url is given
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Feed URL to read posts from
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Document containing the marker region
    #[arg(short, long)]
    pub document: Option<PathBuf>,

    /// Maximum number of posts to list
    #[arg(long)]
    pub max_entries: Option<usize>,

    /// Maximum summary length in characters
    #[arg(long)]
    pub max_summary_chars: Option<usize>,

    /// Fetch timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the updated document instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Loads the config file, if any, and applies command-line overrides.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match (&self.config, &self.feed_url) {
            (Some(path), _) => Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            (None, Some(url)) => Config::new(url.clone()),
            (None, None) => Config::load(DEFAULT_CONFIG_PATH).with_context(|| {
                format!(
                    "Failed to load {} (pass --config or --feed-url)",
                    DEFAULT_CONFIG_PATH
                )
            })?,
        };

        if let Some(url) = &self.feed_url {
            config.feed_url = url.clone();
        }
        if let Some(document) = &self.document {
            config.document = document.clone();
        }
        if let Some(max) = self.max_entries {
            config.max_entries = max;
        }
        if let Some(max) = self.max_summary_chars {
            config.max_summary_chars = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}
