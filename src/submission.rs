use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::classify::Suggestion;
use crate::error::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MAX_CHARS: usize = 220;

/// Override labels recognised in a submission body.
pub const LABELS: [&str; 4] = ["Category", "Group", "Description", "Title"];

/// One issue-style submission: the target URL plus any explicit overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub url: String,
    pub overrides: Overrides,
}

impl Submission {
    /// The first URL in the title wins, then the body. Overrides come from the body.
    pub fn parse(title: &str, body: &str) -> Result<Self> {
        let url = first_url(title)
            .or_else(|| first_url(body))
            .ok_or(Error::NoUrl)?;
        Ok(Submission {
            url: url.to_string(),
            overrides: Overrides::parse(body),
        })
    }
}

pub fn first_url(text: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap());
    re.find(text).map(|m| m.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub category: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
}

impl Overrides {
    pub fn parse(text: &str) -> Self {
        Overrides {
            category: read_label(text, LABELS[0]),
            group: read_label(text, LABELS[1]),
            description: read_label(text, LABELS[2]),
            title: read_label(text, LABELS[3]),
        }
    }

    /// Every label present replaces the suggested value. A category override
    /// also replaces the slug.
    pub fn apply(&self, mut s: Suggestion) -> Suggestion {
        if let Some(category) = &self.category {
            s.category_name = category.clone();
            s.category_slug = slugify(category);
        }
        if let Some(group) = &self.group {
            s.group_name = Some(group.clone());
        }
        if let Some(description) = &self.description {
            s.description = truncate_chars(description, DESCRIPTION_MAX_CHARS);
        }
        if let Some(title) = &self.title {
            s.short_title = truncate_chars(title, TITLE_MAX_CHARS);
        }
        s
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.group.is_none()
            && self.description.is_none()
            && self.title.is_none()
    }
}

/// Value of the first `Label: value` occurrence. The label must open a line or
/// follow whitespace; the value runs to the next label on that line, or its end.
pub fn read_label(text: &str, label: &str) -> Option<String> {
    let pattern = format!(r"(?im)(?:^|\s){}:[ \t]*(\S.*)$", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let rest = re.captures(text)?.get(1)?.as_str();
    let value = match next_label().find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

fn next_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)(?:^|\s)(?:{}):", LABELS.join("|"))).unwrap())
}

/// Lowercase ASCII, accents folded (`é` -> `e`), runs of anything else
/// collapsed to `-`, edges trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    let folded = name.nfkd().filter(|c| !is_combining_mark(*c));
    for c in folded.flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "general".to_string()
    } else {
        slug
    }
}

/// Character-based prefix, safe for multi-byte text.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
