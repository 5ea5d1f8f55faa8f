//! Keyword discovery: search results become catalog entries, grouped per author.

use std::collections::{HashMap, HashSet};

use platforms_parser::extractor::platforms::bilibili::{models::SearchResult, strip_highlight};
use tracing::{debug, info, warn};

use crate::{
    Result,
    catalog::{Catalog, CatalogStore, MediaItem},
    resolver::{MetadataSource, StreamResolver},
};

/// Upper bound on search pages fetched per keyword.
pub const DEFAULT_MAX_PAGES: u32 = 20;

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_pages: u32,
    /// Resolve stream URLs while appending new items.
    pub resolve: bool,
    /// Keep only results published by this author.
    pub only_author: Option<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            resolve: true,
            only_author: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub results: usize,
    pub added: usize,
    pub known: usize,
    /// `(bvid, error)` for uploads whose metadata could not be fetched.
    pub failed: Vec<(String, String)>,
    /// Authors whose catalogs were touched, in first-seen order.
    pub authors: Vec<String>,
}

pub struct Discovery<S, D, R> {
    store: S,
    source: D,
    resolver: R,
    options: DiscoveryOptions,
}

impl<S, D, R> Discovery<S, D, R>
where
    S: CatalogStore,
    D: MetadataSource,
    R: StreamResolver,
{
    pub fn new(store: S, source: D, resolver: R) -> Self {
        Self {
            store,
            source,
            resolver,
            options: DiscoveryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Collect search results page by page.
    ///
    /// Stops at the first empty page or after `max_pages` pages. A failing
    /// first page is an error; a later failure ends pagination early.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchResult>> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for page in 1..=self.options.max_pages {
            let hits = match self.source.search_page(keyword, page).await {
                Ok(hits) => hits,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(keyword = %keyword, page, error = %e, "Search page failed, stopping");
                    break;
                }
            };

            if hits.is_empty() {
                debug!(keyword = %keyword, page, "No more search results");
                break;
            }

            debug!(keyword = %keyword, page, hits = hits.len(), "Search page");
            for hit in hits {
                if seen.insert(hit.bvid.clone()) {
                    results.push(hit);
                }
            }
        }

        Ok(results)
    }

    async fn catalog_for<'a>(
        &self,
        catalogs: &'a mut HashMap<String, Catalog>,
        order: &mut Vec<String>,
        author: &str,
    ) -> Result<&'a mut Catalog> {
        if !catalogs.contains_key(author) {
            let catalog = self
                .store
                .load(author)
                .await?
                .unwrap_or_else(|| Catalog::new(author));
            catalogs.insert(author.to_string(), catalog);
            order.push(author.to_string());
        }
        catalogs
            .get_mut(author)
            .ok_or_else(|| crate::Error::Other(format!("catalog for {author} vanished")))
    }

    /// Search for `keyword` and append every unknown page to its author's catalog.
    ///
    /// The catalog is persisted after each append.
    pub async fn run(&self, keyword: &str) -> Result<DiscoveryReport> {
        let hits = self.search(keyword).await?;
        info!(keyword = %keyword, results = hits.len(), "Search finished");

        let mut report = DiscoveryReport {
            results: hits.len(),
            ..Default::default()
        };
        let mut catalogs: HashMap<String, Catalog> = HashMap::new();

        for hit in hits {
            if let Some(only) = &self.options.only_author
                && &hit.author != only
            {
                continue;
            }

            let view = match self.source.video_info(&hit.bvid).await {
                Ok(view) => view,
                Err(e) => {
                    warn!(
                        bvid = %hit.bvid,
                        title = %strip_highlight(&hit.title),
                        error = %e,
                        "Failed to fetch video info"
                    );
                    report.failed.push((hit.bvid, e.to_string()));
                    continue;
                }
            };

            let catalog = self
                .catalog_for(&mut catalogs, &mut report.authors, &view.owner.name)
                .await?;

            for page in &view.pages {
                if catalog.contains(page.cid) {
                    report.known += 1;
                    continue;
                }

                let mut item = MediaItem::from_page(&view, page);
                if self.options.resolve {
                    match self.resolver.resolve(&item).await {
                        Ok(streams) => item.set_resolution(&streams),
                        Err(e) => {
                            warn!(
                                bvid = %item.identifier,
                                cid = item.content_key,
                                error = %e,
                                "Resolution failed, storing unresolved"
                            );
                        }
                    }
                }

                info!(author = %item.author, title = %item.title, part = %item.part, "New item");
                if self.store.merge(catalog, vec![item]) > 0 {
                    self.store.persist(catalog).await?;
                    report.added += 1;
                }
            }
        }

        info!(
            added = report.added,
            known = report.known,
            failed = report.failed.len(),
            "Discovery finished"
        );
        Ok(report)
    }
}
