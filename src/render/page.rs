use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::region::{escape_html, insert_between, replace_between, CARDS_END, CARDS_START};
use crate::error::{Error, MissingMarkers, Result};
use crate::settings::Site;
use crate::store::CategoryDocument;

pub const NAME_PLACEHOLDER: &str = "{{CATEGORY_NAME}}";
pub const SLUG_PLACEHOLDER: &str = "{{CATEGORY_SLUG}}";

pub fn page_path(site: &Site, slug: &str) -> PathBuf {
    site.categories_dir.join(format!("{}.html", slug))
}

/// Create `categories/<slug>.html` from the template unless it already exists.
/// Existing pages are never rewritten here.
pub fn ensure_category_page(site: &Site, name: &str, slug: &str) -> Result<PathBuf> {
    let path = page_path(site, slug);
    if path.exists() {
        debug!(path = %path.display(), "Category page exists");
        return Ok(path);
    }

    let template = fs::read_to_string(&site.template).map_err(|e| Error::io(&site.template, e))?;
    let html = fill_template(&template, name, slug);
    fs::create_dir_all(&site.categories_dir).map_err(|e| Error::io(&site.categories_dir, e))?;
    fs::write(&path, html).map_err(|e| Error::io(&path, e))?;
    info!(path = %path.display(), "Created category page");
    Ok(path)
}

pub fn fill_template(template: &str, name: &str, slug: &str) -> String {
    template
        .replace(NAME_PLACEHOLDER, &escape_html(name))
        .replace(SLUG_PLACEHOLDER, slug)
}

/// One heading line per group followed by one card per item, in document order.
pub fn card_lines(doc: &CategoryDocument) -> Vec<String> {
    let mut lines = Vec::with_capacity(doc.item_count() + doc.groups.len());
    for group in &doc.groups {
        let group_name = escape_html(&group.name);
        lines.push(format!(r#"<li class="group-heading">{}</li>"#, group_name));
        for item in &group.items {
            lines.push(format!(
                r#"<li class="card" data-group="{}"><a href="{}">{}</a> <span>{}</span></li>"#,
                group_name,
                escape_html(&item.url),
                escape_html(&item.title),
                escape_html(&item.description),
            ));
        }
    }
    lines
}

/// Rebuild the card region from `doc`. Missing markers mean a broken template.
pub fn render_cards(html: &str, doc: &CategoryDocument) -> std::result::Result<String, MissingMarkers> {
    let empty: [&str; 0] = [];
    let mut out = replace_between(html, CARDS_START, CARDS_END, &empty)?;
    for line in card_lines(doc) {
        out = insert_between(&out, CARDS_START, CARDS_END, &line, Some(line.as_str()))?;
    }
    Ok(out)
}

/// Rewrite the page at `path` with fresh cards. Returns whether the file changed.
pub fn write_cards(path: &Path, doc: &CategoryDocument) -> Result<bool> {
    let html = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let updated = render_cards(&html, doc).map_err(|marker| Error::MissingMarkers {
        path: path.to_path_buf(),
        marker,
    })?;
    if updated == html {
        return Ok(false);
    }
    fs::write(path, updated).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), cards = doc.item_count(), "Rendered cards");
    Ok(true)
}
