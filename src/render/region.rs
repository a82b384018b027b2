//! Marker-delimited regions inside HTML artifacts.
//!
//! Everything here is a pure string transformation. Text before the start
//! marker and after the end marker is never touched.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::MissingMarkers;

pub const CARDS_START: &str = "<!-- AUTO-CARDS:START -->";
pub const CARDS_END: &str = "<!-- AUTO-CARDS:END -->";
pub const CATEGORIES_START: &str = "<!-- AUTO-CATEGORIES:START -->";
pub const CATEGORIES_END: &str = "<!-- AUTO-CATEGORIES:END -->";

/// A document split around a marker pair. `before` ends with the start marker,
/// `after` begins with the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'a> {
    pub before: &'a str,
    pub middle: &'a str,
    pub after: &'a str,
}

impl<'a> Region<'a> {
    /// Non-blank lines between the markers, untrimmed.
    pub fn lines(&self) -> Vec<&'a str> {
        self.middle.lines().filter(|l| !l.trim().is_empty()).collect()
    }

    /// Whitespace indenting the end marker on its own line.
    pub fn end_indent(&self) -> &'a str {
        match self.middle.rsplit_once('\n') {
            Some((_, tail)) if tail.trim().is_empty() => tail,
            _ => "",
        }
    }

    pub fn assemble<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut out = String::with_capacity(self.before.len() + self.middle.len() + self.after.len() + 64);
        out.push_str(self.before);
        out.push('\n');
        for line in lines {
            out.push_str(line.as_ref());
            out.push('\n');
        }
        out.push_str(self.end_indent());
        out.push_str(self.after);
        out
    }
}

/// First occurrence of each marker.
pub fn locate<'a>(whole: &'a str, start: &str, end: &str) -> Result<Region<'a>, MissingMarkers> {
    let missing = || MissingMarkers {
        start: start.to_string(),
        end: end.to_string(),
    };
    let s = whole.find(start).ok_or_else(missing)?;
    let e = whole.find(end).ok_or_else(missing)?;
    let body_start = s + start.len();
    if e < body_start {
        return Err(missing());
    }
    Ok(Region {
        before: &whole[..body_start],
        middle: &whole[body_start..e],
        after: &whole[e..],
    })
}

/// Append `new_line` inside the region, unless a line equal to `dedupe`
/// (both trimmed) is already there, in which case `whole` comes back as is.
/// Blank lines inside the region are dropped.
pub fn insert_between(
    whole: &str,
    start: &str,
    end: &str,
    new_line: &str,
    dedupe: Option<&str>,
) -> Result<String, MissingMarkers> {
    let region = locate(whole, start, end)?;
    let mut lines = region.lines();
    if let Some(key) = dedupe {
        let key = key.trim();
        if lines.iter().any(|l| l.trim() == key) {
            return Ok(whole.to_string());
        }
    }
    lines.push(new_line.trim_end());
    Ok(region.assemble(&lines))
}

/// Replace everything between the markers with `lines`.
pub fn replace_between<S: AsRef<str>>(
    whole: &str,
    start: &str,
    end: &str,
    lines: &[S],
) -> Result<String, MissingMarkers> {
    Ok(locate(whole, start, end)?.assemble(lines))
}

/// `<li>...</li>` entries, in order. Entries may span lines.
pub fn list_items(markup: &str) -> Vec<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?is)<li\b[^>]*>.*?</li>").unwrap());
    re.find_iter(markup).map(|m| m.as_str()).collect()
}

/// Markup with tags stripped, trimmed.
pub fn visible_text(markup: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)<.*?>").unwrap());
    re.replace_all(markup, "").trim().to_string()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
