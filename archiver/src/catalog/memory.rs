use std::{
    collections::HashMap,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{model::Catalog, store::CatalogStore};
use crate::{Error, Result};

/// In-memory catalog store.
///
/// Keeps every persisted snapshot so callers can inspect what was durable at
/// each point of a run. Persisting can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    root: PathBuf,
    catalogs: Mutex<HashMap<String, Catalog>>,
    history: Mutex<Vec<Catalog>>,
    fail_persist: AtomicBool,
}

impl MemoryCatalogStore {
    /// `root` is only used to derive media directories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Seed a catalog without recording a persist.
    pub fn insert(&self, catalog: Catalog) {
        self.catalogs.lock().insert(catalog.author.clone(), catalog);
    }

    pub fn get(&self, author: &str) -> Option<Catalog> {
        self.catalogs.lock().get(author).cloned()
    }

    /// Every catalog snapshot persisted so far, oldest first.
    pub fn history(&self) -> Vec<Catalog> {
        self.history.lock().clone()
    }

    pub fn persist_count(&self) -> usize {
        self.history.lock().len()
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn load(&self, author: &str) -> Result<Option<Catalog>> {
        Ok(self.get(author))
    }

    async fn persist(&self, catalog: &Catalog) -> Result<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(Error::Other(format!(
                "persist rejected for {}",
                catalog.author
            )));
        }
        self.catalogs
            .lock()
            .insert(catalog.author.clone(), catalog.clone());
        self.history.lock().push(catalog.clone());
        Ok(())
    }

    fn author_dir(&self, author: &str) -> PathBuf {
        self.root
            .join(crate::utils::filename::sanitize_filename(author))
    }
}
