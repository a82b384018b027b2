use tracing::info;

use crate::classify::{self, Classifier};
use crate::error::Result;
use crate::outputs::Outcome;
use crate::render;
use crate::resolver::MetadataResolver;
use crate::settings::Site;
use crate::store::{self, Item, DEFAULT_GROUP};
use crate::submission::Submission;

/// Everything one run needs: the collaborators picked at startup and the site layout.
pub struct Pipeline<'a> {
    pub resolver: &'a dyn MetadataResolver,
    pub classifier: &'a dyn Classifier,
    pub site: Site,
    pub render_cards: bool,
}

impl Pipeline<'_> {
    /// Parse the issue text, then run the submission. Input errors surface
    /// before any network or filesystem access.
    pub fn ingest(&self, title: &str, body: &str) -> Result<Outcome> {
        let submission = Submission::parse(title, body)?;
        self.run(&submission)
    }

    /// fetch -> classify -> overrides -> store -> artifacts.
    ///
    /// Nothing is written until metadata and classification succeed. The JSON
    /// store is written before the HTML artifacts; a crash between the two is
    /// repaired by running the same submission again.
    pub fn run(&self, submission: &Submission) -> Result<Outcome> {
        let meta = self.resolver.resolve(&submission.url)?;
        info!(title = %meta.title, resolved = %meta.resolved_url, "Resolved metadata");

        let suggested = classify::classify_or_fallback(self.classifier, &meta);
        let placed = submission.overrides.apply(suggested);
        let group_name = placed
            .group_name
            .clone()
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());
        info!(
            category = %placed.category_name,
            slug = %placed.category_slug,
            group = %group_name,
            overridden = !submission.overrides.is_empty(),
            "Classified submission"
        );

        let (mut doc, doc_path) =
            store::load_or_create(&self.site.data_dir, &placed.category_slug, &placed.category_name)?;
        doc.upsert(
            &group_name,
            Item::new(&placed.short_title, &meta.resolved_url, &placed.description),
        );
        store::persist(&doc, &doc_path)?;

        let page = render::ensure_category_page(&self.site, &placed.category_name, &placed.category_slug)?;
        if self.render_cards {
            render::write_cards(&page, &doc)?;
        }
        render::ensure_index_link(&self.site.index, &placed.category_name, &placed.category_slug)?;

        Ok(Outcome {
            short_title: placed.short_title,
            category_name: placed.category_name,
            category_slug: placed.category_slug,
            group_name,
            url: meta.resolved_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::classify::{KeywordClassifier, Suggestion};
    use crate::error::{ClassifierError, Error};
    use crate::resolver::PageMeta;
    use crate::store::CategoryDocument;
    use crate::testutil::ScratchDir;

    struct StubResolver {
        meta: PageMeta,
        calls: Cell<usize>,
    }

    impl StubResolver {
        fn example_tool() -> Self {
            StubResolver {
                meta: PageMeta {
                    title: "Example Tool".into(),
                    description: "A domain tool".into(),
                    resolved_url: "https://example.com/tool".into(),
                },
                calls: Cell::new(0),
            }
        }
    }

    impl MetadataResolver for StubResolver {
        fn resolve(&self, _url: &str) -> Result<PageMeta> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.meta.clone())
        }
    }

    struct FailingResolver;

    impl MetadataResolver for FailingResolver {
        fn resolve(&self, url: &str) -> Result<PageMeta> {
            Err(Error::FetchStatus {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    /// Always files pages under Marketplaces, like a configured model would.
    struct MarketplaceModel;

    impl Classifier for MarketplaceModel {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn classify(&self, meta: &PageMeta) -> std::result::Result<Suggestion, ClassifierError> {
            Ok(Suggestion {
                category_name: "Marketplaces".into(),
                category_slug: "marketplaces".into(),
                group_name: None,
                short_title: meta.title.clone(),
                description: meta.description.clone(),
            })
        }
    }

    fn site(dir: &ScratchDir) -> Site {
        dir.write(
            "templates/category.html",
            &std::fs::read_to_string("tests/fixtures/category_template.html").unwrap(),
        );
        dir.write("index.html", &std::fs::read_to_string("tests/fixtures/index.html").unwrap());
        Site::new(dir.path())
    }

    fn load(dir: &ScratchDir, slug: &str) -> CategoryDocument {
        serde_json::from_str(&dir.read(&format!("data/{}.json", slug))).unwrap()
    }

    #[test]
    fn new_link_with_category_override() {
        let dir = ScratchDir::new("pipeline-a");
        let resolver = StubResolver::example_tool();
        let pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };

        let outcome = pipeline
            .ingest("", "Check out https://example.com/tool Category: Marketplaces")
            .unwrap();
        assert_eq!(outcome.category_name, "Marketplaces");
        assert_eq!(outcome.short_title, "Example Tool");
        assert_eq!(outcome.url, "https://example.com/tool");

        let doc = load(&dir, "marketplaces");
        assert_eq!(doc.category, "Marketplaces");
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.groups[0].name, "General");
        assert_eq!(
            doc.groups[0].items,
            [Item::new("Example Tool", "https://example.com/tool", "A domain tool")]
        );

        let index = dir.read("index.html");
        assert!(index.contains(r#"<li><a href="categories/marketplaces.html">Marketplaces</a></li>"#));
        let page = dir.read("categories/marketplaces.html");
        assert!(page.contains("<h1>Marketplaces</h1>"));
        assert!(page.contains(r#"<a href="https://example.com/tool">Example Tool</a>"#));
    }

    #[test]
    fn resubmission_updates_description_only() {
        let dir = ScratchDir::new("pipeline-b");
        let resolver = StubResolver::example_tool();
        let mut pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };
        pipeline
            .ingest("", "Check out https://example.com/tool Category: Marketplaces")
            .unwrap();
        let index_before = dir.read("index.html");

        pipeline.classifier = &MarketplaceModel;
        pipeline
            .ingest("https://example.com/tool/", "Description: Updated summary")
            .unwrap();

        let doc = load(&dir, "marketplaces");
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(
            doc.groups[0].items,
            [Item::new("Example Tool", "https://example.com/tool", "Updated summary")]
        );
        assert!(!dir.path().join("data/general.json").exists());
        assert_eq!(dir.read("index.html"), index_before);
        let page = dir.read("categories/marketplaces.html");
        assert!(page.contains("<span>Updated summary</span>"));
        assert_eq!(page.matches("class=\"card\"").count(), 1);
    }

    #[test]
    fn same_submission_twice_converges() {
        let dir = ScratchDir::new("pipeline-twice");
        let resolver = StubResolver::example_tool();
        let pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };
        let body = "https://example.com/tool\nGroup: Utilities";
        pipeline.ingest("", body).unwrap();
        let first = dir.snapshot();
        pipeline.ingest("", body).unwrap();
        assert_eq!(dir.snapshot(), first);
        assert_eq!(load(&dir, "general").groups[0].name, "Utilities");
    }

    #[test]
    fn no_url_touches_nothing() {
        let dir = ScratchDir::new("pipeline-c");
        let resolver = StubResolver::example_tool();
        let pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };
        let before = dir.snapshot();

        let err = pipeline.ingest("Please add this", "Category: Marketplaces").unwrap_err();
        assert!(matches!(err, Error::NoUrl));
        assert_eq!(resolver.calls.get(), 0);
        assert_eq!(dir.snapshot(), before);
    }

    #[test]
    fn fetch_failure_touches_nothing() {
        let dir = ScratchDir::new("pipeline-fetch");
        let pipeline = Pipeline {
            resolver: &FailingResolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };
        let before = dir.snapshot();
        let err = pipeline.ingest("https://gone.example", "").unwrap_err();
        assert!(matches!(err, Error::FetchStatus { .. }));
        assert_eq!(dir.snapshot(), before);
    }

    #[test]
    fn corrupt_store_aborts_without_overwriting() {
        let dir = ScratchDir::new("pipeline-corrupt");
        let resolver = StubResolver::example_tool();
        let pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: site(&dir),
            render_cards: true,
        };
        dir.write("data/marketplaces.json", "[not a document");
        let before = dir.snapshot();
        let err = pipeline
            .ingest("", "https://example.com/tool\nCategory: Marketplaces")
            .unwrap_err();
        assert!(matches!(err, Error::StoreCorrupt { .. }));
        assert_eq!(dir.snapshot(), before);
    }

    #[test]
    fn works_without_index_and_without_cards() {
        let dir = ScratchDir::new("pipeline-bare");
        dir.write("templates/category.html", "<h1>{{CATEGORY_NAME}}</h1>\n");
        let resolver = StubResolver::example_tool();
        let pipeline = Pipeline {
            resolver: &resolver,
            classifier: &KeywordClassifier,
            site: Site::new(dir.path()),
            render_cards: false,
        };
        let outcome = pipeline.ingest("https://example.com/tool", "").unwrap();
        assert_eq!(outcome.category_slug, "general");
        assert_eq!(dir.read("categories/general.html"), "<h1>General</h1>\n");
        assert!(!dir.path().join("index.html").exists());
    }
}
