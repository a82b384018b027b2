pub mod keyword;
pub mod model;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{ClassifierError, Result};
use crate::resolver::PageMeta;
use crate::settings::Settings;
use crate::submission::{slugify, truncate_chars, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

pub use keyword::KeywordClassifier;
pub use model::ModelClassifier;

/// Where a page should be filed and how it should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub category_name: String,
    pub category_slug: String,
    pub group_name: Option<String>,
    pub short_title: String,
    pub description: String,
}

/// A suggestion with holes, as returned by the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialSuggestion {
    pub category_name: Option<String>,
    #[serde(alias = "category_slug")]
    pub suggested_category_slug: Option<String>,
    pub group_name: Option<String>,
    pub short_title: Option<String>,
    pub description: Option<String>,
}

impl PartialSuggestion {
    /// Fill missing or blank fields from the keyword suggestion for the same page.
    pub fn backfill(self, meta: &PageMeta) -> Suggestion {
        let fallback = keyword::suggest(meta);
        let category_name = present(self.category_name).unwrap_or(fallback.category_name);
        let category_slug = present(self.suggested_category_slug)
            .map(|s| slugify(&s))
            .unwrap_or_else(|| slugify(&category_name));
        Suggestion {
            category_name,
            category_slug,
            group_name: present(self.group_name),
            short_title: present(self.short_title)
                .map(|t| truncate_chars(&t, TITLE_MAX_CHARS))
                .unwrap_or(fallback.short_title),
            description: present(self.description)
                .map(|d| truncate_chars(&d, DESCRIPTION_MAX_CHARS))
                .unwrap_or(fallback.description),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub trait Classifier {
    fn name(&self) -> &'static str;

    fn classify(&self, meta: &PageMeta) -> std::result::Result<Suggestion, ClassifierError>;
}

/// Model-backed when an API key is configured and not disabled, keywords otherwise.
pub fn from_settings(settings: &Settings, allow_model: bool) -> Result<Box<dyn Classifier>> {
    match (&settings.openai_api_key, allow_model) {
        (Some(key), true) => {
            info!(model = %settings.model, "Using model-backed classifier");
            Ok(Box::new(ModelClassifier::from_settings(settings, key)?))
        }
        _ => {
            info!("Using keyword classifier");
            Ok(Box::new(KeywordClassifier))
        }
    }
}

/// Classify, recovering from any classifier failure with the keyword rules.
pub fn classify_or_fallback(classifier: &dyn Classifier, meta: &PageMeta) -> Suggestion {
    match classifier.classify(meta) {
        Ok(s) => s,
        Err(e) => {
            warn!(classifier = classifier.name(), error = %e, "Classifier failed, using keyword rules");
            keyword::suggest(meta)
        }
    }
}
