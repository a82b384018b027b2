use super::{Classifier, Suggestion};
use crate::error::ClassifierError;
use crate::resolver::PageMeta;
use crate::submission::{slugify, truncate_chars, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

pub const DEFAULT_CATEGORY: &str = "General";

/// Checked top to bottom; the first rule with a matching keyword wins.
const RULES: &[(&str, &[&str])] = &[
    ("Domain Blogs", &["blog", "news", "journal"]),
    ("Marketplaces", &["marketplace", "afternic", "sedo", "dan.com", "buy domains"]),
    ("Appraisal Tools", &["appraisal", "valuation", "worth"]),
    ("Name Generators", &["generator", "brainstorm", "ideas"]),
    ("WHOIS / Research", &["whois", "dns", "lookup"]),
    ("Drops & Auctions", &["expired", "auction", "backorder", "drop", "closeout"]),
    ("Brandable Marketplaces", &["brandable", "brandbucket", "atom", "squadhelp"]),
];

pub fn category_for(title: &str, description: &str, url: &str) -> &'static str {
    let haystack = format!("{} {} {}", title, description, url).to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(name, _)| *name)
        .unwrap_or(DEFAULT_CATEGORY)
}

pub fn suggest(meta: &PageMeta) -> Suggestion {
    let category_name = category_for(&meta.title, &meta.description, &meta.resolved_url);
    let description = if meta.description.is_empty() {
        format!("Resource: {}", meta.title)
    } else {
        meta.description.clone()
    };
    Suggestion {
        category_name: category_name.to_string(),
        category_slug: slugify(category_name),
        group_name: None,
        short_title: truncate_chars(&meta.title, TITLE_MAX_CHARS),
        description: truncate_chars(&description, DESCRIPTION_MAX_CHARS),
    }
}

pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn classify(&self, meta: &PageMeta) -> Result<Suggestion, ClassifierError> {
        Ok(suggest(meta))
    }
}
