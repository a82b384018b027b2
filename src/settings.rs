use std::path::{Path, PathBuf};

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::Result;

const ENV_PREFIX: &str = "LINK_INGEST";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Site checkout holding `data/`, `categories/`, `templates/` and `index.html`.
    pub root: PathBuf,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub model: String,
    pub model_base_url: String,
    pub render_cards: bool,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    /// Workflow output channel (`GITHUB_OUTPUT`).
    #[serde(skip)]
    pub output_file: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `LINK_INGEST_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings: Settings = Config::builder()
            .set_default("root", ".")?
            .set_default("fetch_timeout_secs", 20)?
            .set_default("user_agent", "DomainBookmarksBot/1.1")?
            .set_default("model", "gpt-4o-mini")?
            .set_default("model_base_url", "https://api.openai.com/v1")?
            .set_default("render_cards", true)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.openai_api_key = non_empty_env("OPENAI_API_KEY");
        settings.output_file = non_empty_env("GITHUB_OUTPUT").map(PathBuf::from);
        Ok(settings)
    }

    pub fn site(&self) -> Site {
        Site::new(&self.root)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Filesystem layout of the static site.
#[derive(Debug, Clone)]
pub struct Site {
    pub data_dir: PathBuf,
    pub categories_dir: PathBuf,
    pub template: PathBuf,
    pub index: PathBuf,
}

impl Site {
    pub fn new(root: &Path) -> Self {
        Site {
            data_dir: root.join("data"),
            categories_dir: root.join("categories"),
            template: root.join("templates").join("category.html"),
            index: root.join("index.html"),
        }
    }
}
