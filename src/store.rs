//! Per-category JSON content store.
//!
//! One `CategoryDocument` per slug lives at `data/<slug>.json`. Every
//! submission reads the whole document, merges one item and writes the whole
//! document back. Two invocations touching the same slug at the same time can
//! lose an update: callers must serialize runs per category.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const DEFAULT_GROUP: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDocument {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>, description: impl Into<String>) -> Self {
        Item {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }

    /// Identity key: the URL without trailing slashes.
    pub fn key(&self) -> &str {
        url_key(&self.url)
    }

    /// Copy over every non-empty field of `incoming`; empty fields never erase.
    fn merge_from(&mut self, incoming: Item) {
        if !incoming.title.is_empty() {
            self.title = incoming.title;
        }
        if !incoming.url.is_empty() {
            self.url = incoming.url;
        }
        if !incoming.description.is_empty() {
            self.description = incoming.description;
        }
        for (k, v) in incoming.extra {
            if is_truthy(&v) {
                self.extra.insert(k, v);
            }
        }
    }
}

pub fn url_key(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

impl Group {
    fn new(name: &str) -> Self {
        Group {
            name: name.to_string(),
            items: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl CategoryDocument {
    pub fn new(category: impl Into<String>) -> Self {
        CategoryDocument {
            category: category.into(),
            groups: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Insert `item` into `group_name` (blank means "General"), or merge it into
    /// the item with the same identity key. Groups and items are re-sorted.
    pub fn upsert(&mut self, group_name: &str, item: Item) {
        let group_name = match group_name.trim() {
            "" => DEFAULT_GROUP,
            name => name,
        };
        let wanted = group_name.to_lowercase();

        let idx = match self
            .groups
            .iter()
            .position(|g| g.name.to_lowercase() == wanted)
        {
            Some(i) => i,
            None => {
                self.groups.push(Group::new(group_name));
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[idx];
        match group.items.iter_mut().find(|x| x.key() == item.key()) {
            Some(existing) => {
                debug!(url = %item.url, group = %group.name, "Updating existing item");
                existing.merge_from(item);
            }
            None => {
                debug!(url = %item.url, group = %group.name, "Adding new item");
                group.items.push(item);
            }
        }

        group.items.sort_by_key(|x| x.title.to_lowercase());
        self.groups.sort_by_key(|g| g.name.to_lowercase());
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

pub fn document_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{}.json", slug))
}

/// Load `dir/<slug>.json`, or start a fresh document named `name_hint`.
pub fn load_or_create(dir: &Path, slug: &str, name_hint: &str) -> Result<(CategoryDocument, PathBuf)> {
    let path = document_path(dir, slug);
    if !path.exists() {
        info!(slug = %slug, "Creating category document");
        return Ok((CategoryDocument::new(name_hint), path));
    }

    let raw = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    let mut doc: CategoryDocument = serde_json::from_str(&raw).map_err(|source| Error::StoreCorrupt {
        path: path.clone(),
        source,
    })?;
    if doc.category.trim().is_empty() {
        doc.category = if name_hint.trim().is_empty() {
            slug.to_string()
        } else {
            name_hint.to_string()
        };
    }
    debug!(slug = %slug, groups = doc.groups.len(), items = doc.item_count(), "Loaded category document");
    Ok((doc, path))
}

/// Replace the file at `path` with the full pretty-printed document.
pub fn persist(doc: &CategoryDocument, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let mut json = serde_json::to_string_pretty(doc).map_err(|source| Error::StoreCorrupt {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), items = doc.item_count(), "Wrote category document");
    Ok(())
}
