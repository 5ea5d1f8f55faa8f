use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use platforms_parser::{
    Bilibili, ExtractorError,
    extractor::{build_client, platforms::bilibili::extract_bvid},
};
use tracing::{info, warn};

use crate::{
    Error, Result,
    acquisition::{
        AcquisitionOptions, AcquisitionOrchestrator, AcquisitionReport, ItemOutcome, acquire_item,
    },
    catalog::{CatalogStore, FsCatalogStore, MediaItem},
    config::AppConfig,
    discovery::{Discovery, DiscoveryOptions, DiscoveryReport},
    downloader::{HttpTransfer, IndicatifProgress},
    remux::FfmpegRemuxer,
    resolver::StreamResolver,
    utils::fs::{ensure_dir_all_with_op, ensure_parent_dir, io_error},
};

pub struct CommandExecutor {
    config: AppConfig,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn store(&self) -> FsCatalogStore {
        FsCatalogStore::new(&self.config.output_root)
    }

    fn platform(&self) -> Result<Arc<Bilibili>> {
        let client = build_client(Some(Duration::from_secs(self.config.request_timeout_secs)))?;
        let cookies = self.config.resolve_cookies()?;
        let bilibili = Bilibili::new(client, cookies.as_deref());
        if !bilibili.is_logged_in() {
            warn!(
                "No session cookie configured, stream quality is limited to what guests may access"
            );
        }
        Ok(Arc::new(bilibili))
    }

    fn transfer(&self) -> Result<HttpTransfer> {
        // Media bodies can take far longer than any API timeout.
        let client = build_client(None)?;
        Ok(HttpTransfer::new(client).with_progress(Arc::new(IndicatifProgress::new())))
    }

    /// The remuxer probes ffmpeg lazily; a missing binary only fails the
    /// items that need remuxing.
    async fn remuxer(&self) -> FfmpegRemuxer {
        let remuxer = FfmpegRemuxer::new(&self.config.ffmpeg_path);
        match remuxer.version().await {
            Some(version) => {
                info!(ffmpeg = %remuxer.ffmpeg_path(), version = %version, "Found ffmpeg");
            }
            None => warn!(
                ffmpeg = %remuxer.ffmpeg_path(),
                "ffmpeg not found, items with separate video and audio streams will fail"
            ),
        }
        remuxer
    }

    pub async fn search(
        &self,
        keyword: &str,
        max_pages: Option<u32>,
        no_resolve: bool,
        only_author: bool,
    ) -> Result<DiscoveryReport> {
        let platform = self.platform()?;
        let options = DiscoveryOptions {
            max_pages: max_pages.unwrap_or(self.config.max_search_pages).max(1),
            resolve: self.config.resolve_on_discovery && !no_resolve,
            only_author: only_author.then(|| keyword.to_string()),
        };

        let discovery =
            Discovery::new(self.store(), platform.clone(), platform).with_options(options);
        let report = discovery.run(keyword).await?;

        println!(
            "{} results, {} new items, {} already cataloged, {} failed",
            report.results,
            report.added,
            report.known,
            report.failed.len()
        );
        for author in &report.authors {
            println!("  {}", discovery.store().catalog_path(author).display());
        }
        for (bvid, error) in &report.failed {
            println!("  failed {bvid}: {error}");
        }
        Ok(report)
    }

    pub async fn download_uper(&self, author: &str, refresh: bool) -> Result<AcquisitionReport> {
        let remuxer = self.remuxer().await;
        let orchestrator =
            AcquisitionOrchestrator::new(self.store(), self.platform()?, self.transfer()?, remuxer)
                .with_options(AcquisitionOptions { reresolve: refresh });

        let report = orchestrator.run(author).await?;

        println!("{report}");
        for item in report.problems() {
            let (kind, reason) = match &item.outcome {
                ItemOutcome::Deferred { reason } => ("deferred", reason.as_str()),
                ItemOutcome::Failed { reason } => ("failed", reason.as_str()),
                _ => continue,
            };
            println!("  {kind} {} {} ({}): {reason}", item.identifier, item.title, item.part);
        }
        Ok(report)
    }

    pub async fn download(
        &self,
        id: &str,
        page: u32,
        dir: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<PathBuf> {
        let bvid = extract_bvid(id)?;
        let platform = self.platform()?;
        let remuxer = self.remuxer().await;

        let view = platform.video_info(&bvid).await?;
        let video_page = view
            .pages
            .iter()
            .find(|p| p.page == page)
            .ok_or(ExtractorError::PageNotFound {
                page,
                available: view.pages.len(),
            })?;
        let item = MediaItem::from_page(&view, video_page);

        let dir = dir.unwrap_or_else(|| self.store().author_dir(&item.author));
        ensure_dir_all_with_op("creating output directory", &dir).await?;

        let streams = platform.resolve(&item).await?;
        let target = dir.join(item.output_relative_path(&streams, false));
        let location = acquire_item(&self.transfer()?, &remuxer, &item, &streams, &target).await?;

        let location = match output {
            Some(target) => move_to(&location, &target).await?,
            None => location,
        };

        println!("{}", location.display());
        Ok(location)
    }

    pub async fn list(&self, author: &str, pending_only: bool) -> Result<()> {
        let catalog = self
            .store()
            .load(author)
            .await?
            .ok_or_else(|| Error::CatalogNotFound(author.to_string()))?;

        for item in &catalog.items {
            if pending_only && item.is_complete() {
                continue;
            }
            let status = if item.is_complete() {
                "done"
            } else if item.cached_streams().is_some() {
                "resolved"
            } else {
                "pending"
            };
            println!(
                "[{status:>8}] {} {} {} / {}",
                item.published_at.format("%Y-%m-%d"),
                item.identifier,
                item.title_dir(),
                item.part_stem()
            );
        }
        println!(
            "{}: {} items, {} done, {} pending",
            catalog.author,
            catalog.items.len(),
            catalog.completed(),
            catalog.pending()
        );
        Ok(())
    }
}

async fn move_to(from: &Path, to: &Path) -> Result<PathBuf> {
    ensure_parent_dir(to).await?;
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| io_error("moving output file", to, e))?;
    Ok(to.to_path_buf())
}
