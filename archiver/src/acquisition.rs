//! Catalog-driven acquisition: resolve, fetch, remux and record each pending item.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use platforms_parser::{ResolvedStreams, StreamKind};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{
    Error, Result,
    catalog::{CatalogStore, MediaItem},
    downloader::TransferEngine,
    remux::Remuxer,
    resolver::StreamResolver,
    utils::fs::{ensure_dir_all_with_op, ensure_parent_dir, io_error},
};

/// Per-run behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcquisitionOptions {
    /// Ignore cached stream URLs and resolve again. Platform URLs expire, so
    /// this is the way to retry items whose cached URLs went stale.
    pub reresolve: bool,
}

/// What happened to one catalog item during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already acquired before this run.
    Skipped,
    /// Acquired in this run.
    Completed { location: String },
    /// Resolution failed; left for a later run.
    Deferred { reason: String },
    /// Resolution succeeded but transfer or remux failed.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub identifier: String,
    pub title: String,
    pub part: String,
    pub outcome: ItemOutcome,
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionReport {
    pub author: String,
    pub items: Vec<ItemReport>,
}

impl AcquisitionReport {
    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Deferred { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    /// Items that did not reach completion in this run.
    pub fn problems(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| {
            matches!(
                i.outcome,
                ItemOutcome::Deferred { .. } | ItemOutcome::Failed { .. }
            )
        })
    }
}

impl fmt::Display for AcquisitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} completed, {} already done, {} deferred, {} failed",
            self.author,
            self.completed(),
            self.skipped(),
            self.deferred(),
            self.failed()
        )
    }
}

fn scratch_file(dir: &Path, prefix: &str, suffix: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(|e| io_error("creating scratch file", dir, e))
}

/// Fetch and assemble one resolved item into `output`.
///
/// Scratch files live next to `output` and are removed on every exit path.
/// Returns the final file path.
pub async fn acquire_item<T, M>(
    transfer: &T,
    remuxer: &M,
    item: &MediaItem,
    streams: &ResolvedStreams,
    output: &Path,
) -> Result<PathBuf>
where
    T: TransferEngine + ?Sized,
    M: Remuxer + ?Sized,
{
    ensure_parent_dir(output).await?;
    let dir = output.parent().unwrap_or_else(|| Path::new("."));

    match streams {
        ResolvedStreams::Dual { video, audio } => {
            let video_tmp = scratch_file(dir, "bilibili_video_", ".m4s")?;
            let audio_tmp = scratch_file(dir, "bilibili_audio_", ".m4s")?;

            let video_label = format!("video {}", video.quality);
            let audio_label = format!("audio {}", audio.quality);
            info!(
                item = %item.identifier,
                title = %item.title,
                video = %video.quality,
                audio = %audio.quality,
                "Downloading streams"
            );

            let (video_res, audio_res) = tokio::join!(
                transfer.fetch(&video_label, &video.url, video_tmp.path()),
                transfer.fetch(&audio_label, &audio.url, audio_tmp.path()),
            );
            match (video_res, audio_res) {
                (Ok(_), Ok(_)) => {}
                (Err(e), Ok(_)) => return Err(Error::transfer(StreamKind::Video, e)),
                (Ok(_), Err(e)) => return Err(Error::transfer(StreamKind::Audio, e)),
                (Err(video), Err(audio)) => {
                    return Err(Error::StreamTransfers {
                        video: Box::new(video),
                        audio: Box::new(audio),
                    });
                }
            }

            remuxer
                .remux(video_tmp.path(), audio_tmp.path(), output)
                .await
        }
        ResolvedStreams::Direct { url, .. } => {
            let tmp = scratch_file(dir, "bilibili_direct_", ".part")?;
            info!(item = %item.identifier, title = %item.title, "Downloading single file");

            transfer
                .fetch("file", url, tmp.path())
                .await
                .map_err(|e| Error::transfer(StreamKind::Combined, e))?;

            tmp.persist(output)
                .map_err(|e| io_error("moving downloaded file", output, e.error))?;
            Ok(output.to_path_buf())
        }
    }
}

/// Drives every incomplete item of an author's catalog to completion.
pub struct AcquisitionOrchestrator<S, R, T, M> {
    store: S,
    resolver: R,
    transfer: T,
    remuxer: M,
    options: AcquisitionOptions,
}

impl<S, R, T, M> AcquisitionOrchestrator<S, R, T, M>
where
    S: CatalogStore,
    R: StreamResolver,
    T: TransferEngine,
    M: Remuxer,
{
    pub fn new(store: S, resolver: R, transfer: T, remuxer: M) -> Self {
        Self {
            store,
            resolver,
            transfer,
            remuxer,
            options: AcquisitionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AcquisitionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn streams_for(&self, item: &MediaItem) -> Result<(ResolvedStreams, bool)> {
        if !self.options.reresolve
            && let Some(cached) = item.cached_streams()
        {
            return Ok((cached, false));
        }
        Ok((self.resolver.resolve(item).await?, true))
    }

    /// Process the author's catalog, one item at a time.
    ///
    /// Per-item failures are reported and the batch continues. Loading or
    /// persisting the catalog, or creating the author directory, aborts.
    pub async fn run(&self, author: &str) -> Result<AcquisitionReport> {
        let mut catalog = self
            .store
            .load(author)
            .await?
            .ok_or_else(|| Error::CatalogNotFound(author.to_string()))?;

        let dir = self.store.author_dir(author);
        ensure_dir_all_with_op("creating author directory", &dir).await?;

        info!(
            author = %author,
            total = catalog.items.len(),
            pending = catalog.pending(),
            "Starting acquisition"
        );

        let mut report = AcquisitionReport {
            author: author.to_string(),
            items: Vec::with_capacity(catalog.items.len()),
        };

        for idx in 0..catalog.items.len() {
            let item = &catalog.items[idx];
            let mut item_report = ItemReport {
                identifier: item.identifier.clone(),
                title: item.title.clone(),
                part: item.part.clone(),
                outcome: ItemOutcome::Skipped,
            };

            if item.is_complete() {
                report.items.push(item_report);
                continue;
            }

            let streams = match self.streams_for(item).await {
                Ok((streams, fresh)) => {
                    if fresh {
                        catalog.items[idx].set_resolution(&streams);
                    }
                    streams
                }
                Err(e) => {
                    warn!(
                        item = %item.identifier,
                        title = %item.title,
                        error = %e,
                        "Resolution failed, deferring"
                    );
                    item_report.outcome = ItemOutcome::Deferred {
                        reason: e.to_string(),
                    };
                    report.items.push(item_report);
                    continue;
                }
            };

            let item = &catalog.items[idx];
            let acquired = match catalog.output_path_for(item, &streams, &dir) {
                Some(output) => {
                    acquire_item(&self.transfer, &self.remuxer, item, &streams, &output).await
                }
                None => Err(Error::OutputClaimed(
                    dir.join(item.output_relative_path(&streams, true)),
                )),
            };
            match acquired {
                Ok(location) => {
                    let location = location.to_string_lossy().into_owned();
                    info!(item = %item.identifier, location = %location, "Item acquired");
                    catalog.items[idx].location = location.clone();
                    self.store.persist(&catalog).await?;
                    item_report.outcome = ItemOutcome::Completed { location };
                }
                Err(e) => {
                    warn!(
                        item = %item.identifier,
                        title = %item.title,
                        error = %e,
                        "Acquisition failed"
                    );
                    item_report.outcome = ItemOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }
            report.items.push(item_report);
        }

        info!("{}", report);
        Ok(report)
    }
}
