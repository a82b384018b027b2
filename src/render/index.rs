use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;
use tracing::{debug, info, warn};

use super::region::{escape_html, list_items, locate, visible_text, CATEGORIES_END, CATEGORIES_START};
use crate::error::{Error, MissingMarkers, Result};

pub fn link_line(name: &str, slug: &str) -> String {
    format!(
        r#"<li><a href="categories/{}.html">{}</a></li>"#,
        slug,
        escape_html(name)
    )
}

/// Slug a list entry links to, if it links to a category page.
pub fn linked_slug(entry: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"href="categories/([^"]+)\.html""#).unwrap());
    re.captures(entry).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// The category list region with `slug` present exactly once, entries sorted
/// by their visible text.
pub fn add_category_link(html: &str, name: &str, slug: &str) -> std::result::Result<String, MissingMarkers> {
    let region = locate(html, CATEGORIES_START, CATEGORIES_END)?;
    let mut entries: Vec<String> = list_items(region.middle)
        .into_iter()
        .unique_by(|li| linked_slug(li).unwrap_or(*li).to_string())
        .map(str::to_string)
        .collect();

    if !entries.iter().any(|li| linked_slug(li) == Some(slug)) {
        entries.push(link_line(name, slug));
    }
    entries.sort_by_cached_key(|li| visible_text(li).to_lowercase());
    Ok(region.assemble(&entries))
}

/// Make sure the index lists `slug`. A missing index file or missing markers
/// leave everything as is. Returns whether the index was rewritten.
pub fn ensure_index_link(index: &Path, name: &str, slug: &str) -> Result<bool> {
    if !index.exists() {
        debug!(path = %index.display(), "No index page, skipping category link");
        return Ok(false);
    }

    let html = fs::read_to_string(index).map_err(|e| Error::io(index, e))?;
    let updated = match add_category_link(&html, name, slug) {
        Ok(updated) => updated,
        Err(e) => {
            warn!(path = %index.display(), error = %e, "Index has no category list, skipping");
            return Ok(false);
        }
    };
    if updated == html {
        return Ok(false);
    }

    fs::write(index, updated).map_err(|e| Error::io(index, e))?;
    info!(slug = %slug, "Linked category on index");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScratchDir;

    fn index() -> String {
        std::fs::read_to_string("tests/fixtures/index.html").unwrap()
    }

    fn listed(html: &str) -> Vec<String> {
        let region = locate(html, CATEGORIES_START, CATEGORIES_END).unwrap();
        list_items(region.middle).iter().map(|li| visible_text(li)).collect()
    }

    #[test]
    fn adds_link_in_sorted_position() {
        let html = add_category_link(&index(), "Marketplaces", "marketplaces").unwrap();
        assert_eq!(listed(&html), ["Appraisal Tools", "Domain Blogs", "Marketplaces", "WHOIS / Research"]);
        assert!(html.contains(r#"<li><a href="categories/marketplaces.html">Marketplaces</a></li>"#));
    }

    #[test]
    fn existing_slug_is_not_duplicated() {
        let once = add_category_link(&index(), "Marketplaces", "marketplaces").unwrap();
        let twice = add_category_link(&once, "Market Places", "marketplaces").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_entries_collapse_by_slug() {
        let html = format!(
            "{}\n<li><a href=\"categories/b.html\">B</a></li>\n<li><a href=\"categories/a.html\">A</a></li>\n<li><a href=\"categories/b.html\">Bee</a></li>\n{}",
            CATEGORIES_START, CATEGORIES_END
        );
        let out = add_category_link(&html, "C", "c").unwrap();
        assert_eq!(listed(&out), ["A", "B", "C"]);
    }

    #[test]
    fn content_outside_markers_is_untouched() {
        let original = index();
        let out = add_category_link(&original, "Zed", "zed").unwrap();
        let head = &original[..original.find(CATEGORIES_START).unwrap()];
        let tail = &original[original.find(CATEGORIES_END).unwrap()..];
        assert!(out.starts_with(head));
        assert!(out.ends_with(tail));
    }

    #[test]
    fn indented_end_marker_survives_rewrite() {
        let html = add_category_link(&index(), "Zed", "zed").unwrap();
        assert!(html.contains(&format!("\n      {}", CATEGORIES_END)));
    }

    #[test]
    fn missing_index_or_markers_is_noop() {
        let dir = ScratchDir::new("index-noop");
        let path = dir.path().join("index.html");
        assert!(!ensure_index_link(&path, "Tools", "tools").unwrap());
        assert!(!path.exists());

        dir.write("index.html", "<ul></ul>");
        assert!(!ensure_index_link(&path, "Tools", "tools").unwrap());
        assert_eq!(dir.read("index.html"), "<ul></ul>");
    }

    #[test]
    fn writes_only_when_changed() {
        let dir = ScratchDir::new("index-write");
        let path = dir.write("index.html", &index());
        assert!(ensure_index_link(&path, "Tools", "tools").unwrap());
        assert!(!ensure_index_link(&path, "Tools", "tools").unwrap());
        assert!(dir.read("index.html").contains("categories/tools.html"));
    }
}
