use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::settings::Settings;

const TITLE_SELECTORS: &[&str] = &[
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
    "title",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"meta[name="description"]"#,
    r#"meta[property="og:description"]"#,
    r#"meta[name="twitter:description"]"#,
];

/// Metadata of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub resolved_url: String,
}

pub trait MetadataResolver {
    /// Fails on unreachable hosts and non-success responses.
    fn resolve(&self, url: &str) -> Result<PageMeta>;
}

/// Blocking HTTP resolver. Holds one client (user agent, timeout) for the run.
pub struct HttpResolver {
    client: reqwest::blocking::Client,
}

impl HttpResolver {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.user_agent,
            Duration::from_secs(settings.fetch_timeout_secs),
        )
    }
}

impl MetadataResolver for HttpResolver {
    fn resolve(&self, url: &str) -> Result<PageMeta> {
        info!(url = %url, "Fetching page metadata");
        let fetch_err = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status,
            });
        }

        let resolved_url = response.url().to_string();
        let html = response.text().map_err(fetch_err)?;
        debug!(resolved = %resolved_url, bytes = html.len(), "Fetched page");

        let (title, description) = extract_meta(&html);
        Ok(PageMeta {
            title: title.unwrap_or_else(|| url.to_string()),
            description: description.unwrap_or_default(),
            resolved_url,
        })
    }
}

/// (title, description) from a page, trying each selector list in priority order.
pub fn extract_meta(html: &str) -> (Option<String>, Option<String>) {
    let doc = Html::parse_document(html);
    (
        pick(&doc, TITLE_SELECTORS),
        pick(&doc, DESCRIPTION_SELECTORS),
    )
}

/// First non-empty value, trying selectors in order. A matched element gives
/// its `content` attribute, or its text when `content` is missing or blank.
fn pick(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        let el = doc.select(&selector).next()?;
        let value = match el.value().attr("content").map(str::trim) {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => el.text().collect::<String>().trim().to_string(),
        };
        Some(value).filter(|v| !v.is_empty())
    })
}
