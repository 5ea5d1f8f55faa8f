//! Stream resolution: which representations exist for an item and where to fetch them.

use std::sync::Arc;

use async_trait::async_trait;
use platforms_parser::{
    Bilibili, ResolvedStreams,
    extractor::platforms::bilibili::models::{SearchResult, VideoView},
};
use tracing::debug;

use crate::{Result, catalog::MediaItem};

/// Resolves an item to direct transfer URLs, choosing the highest quality
/// without user interaction.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, item: &MediaItem) -> Result<ResolvedStreams>;
}

/// Metadata lookups used by discovery and single downloads.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// One page of keyword results. Empty once past the last page.
    async fn search_page(&self, keyword: &str, page: u32) -> Result<Vec<SearchResult>>;

    async fn video_info(&self, bvid: &str) -> Result<VideoView>;
}

#[async_trait]
impl StreamResolver for Bilibili {
    async fn resolve(&self, item: &MediaItem) -> Result<ResolvedStreams> {
        let streams = self
            .resolve_streams(&item.identifier, item.content_key)
            .await?;
        debug!(
            item = %item.identifier,
            cid = item.content_key,
            streams = ?streams,
            "Resolved streams"
        );
        Ok(streams)
    }
}

#[async_trait]
impl MetadataSource for Bilibili {
    async fn search_page(&self, keyword: &str, page: u32) -> Result<Vec<SearchResult>> {
        Ok(self.search_videos(keyword, page).await?)
    }

    async fn video_info(&self, bvid: &str) -> Result<VideoView> {
        Ok(Bilibili::video_info(self, bvid).await?)
    }
}

#[async_trait]
impl<T: StreamResolver + ?Sized> StreamResolver for Arc<T> {
    async fn resolve(&self, item: &MediaItem) -> Result<ResolvedStreams> {
        (**self).resolve(item).await
    }
}

#[async_trait]
impl<T: MetadataSource + ?Sized> MetadataSource for Arc<T> {
    async fn search_page(&self, keyword: &str, page: u32) -> Result<Vec<SearchResult>> {
        (**self).search_page(keyword, page).await
    }

    async fn video_info(&self, bvid: &str) -> Result<VideoView> {
        (**self).video_info(bvid).await
    }
}
