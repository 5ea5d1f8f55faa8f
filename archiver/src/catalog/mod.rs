//! Durable per-author inventory of media items and their acquisition state.

mod memory;
mod model;
mod store;

pub use memory::MemoryCatalogStore;
pub use model::{Catalog, MediaItem};
pub use store::{CATALOG_FILE_NAME, CatalogStore, FsCatalogStore};
