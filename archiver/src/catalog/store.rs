use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::model::{Catalog, MediaItem};
use crate::{
    Result,
    utils::{filename::sanitize_filename, fs},
};

/// File name of the per-author catalog.
pub const CATALOG_FILE_NAME: &str = "videos.yaml";

/// Durable per-author catalog storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load an author's catalog. `None` when it does not exist yet.
    async fn load(&self, author: &str) -> Result<Option<Catalog>>;

    /// Replace the stored catalog with `catalog` in full.
    async fn persist(&self, catalog: &Catalog) -> Result<()>;

    /// Directory holding the author's catalog and acquired media.
    fn author_dir(&self, author: &str) -> PathBuf;

    /// Add items whose content key is unknown. Returns how many were added.
    fn merge(&self, catalog: &mut Catalog, items: Vec<MediaItem>) -> usize {
        catalog.merge(items)
    }
}

#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    async fn load(&self, author: &str) -> Result<Option<Catalog>> {
        (**self).load(author).await
    }

    async fn persist(&self, catalog: &Catalog) -> Result<()> {
        (**self).persist(catalog).await
    }

    fn author_dir(&self, author: &str) -> PathBuf {
        (**self).author_dir(author)
    }

    fn merge(&self, catalog: &mut Catalog, items: Vec<MediaItem>) -> usize {
        (**self).merge(catalog, items)
    }
}

/// YAML files under `<root>/<author>/videos.yaml`.
#[derive(Debug, Clone)]
pub struct FsCatalogStore {
    root: PathBuf,
}

impl FsCatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self, author: &str) -> PathBuf {
        self.author_dir(author).join(CATALOG_FILE_NAME)
    }
}

#[async_trait]
impl CatalogStore for FsCatalogStore {
    async fn load(&self, author: &str) -> Result<Option<Catalog>> {
        let path = self.catalog_path(author);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(fs::io_error("reading catalog", &path, e)),
        };

        let items: Vec<MediaItem> = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_yaml::from_str(&content)?
        };
        let stored = items.len();
        let catalog = Catalog::with_items(author, items);
        if catalog.items.len() < stored {
            warn!(
                author = %author,
                dropped = stored - catalog.items.len(),
                path = %path.display(),
                "Catalog has duplicate content keys, keeping the first record of each"
            );
        }
        debug!(
            author = %author,
            items = catalog.items.len(),
            path = %path.display(),
            "Catalog loaded"
        );

        Ok(Some(catalog))
    }

    async fn persist(&self, catalog: &Catalog) -> Result<()> {
        let path = self.catalog_path(&catalog.author);
        let yaml = serde_yaml::to_string(&catalog.items)?;
        fs::write_replace(&path, yaml.as_bytes()).await?;
        debug!(author = %catalog.author, items = catalog.items.len(), "Catalog persisted");
        Ok(())
    }

    fn author_dir(&self, author: &str) -> PathBuf {
        self.root.join(sanitize_filename(author))
    }
}
