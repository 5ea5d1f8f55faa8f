use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use platforms_parser::{
    Qn, ResolvedStreams,
    extractor::{
        platforms::bilibili::models::{VideoPage, VideoView},
        utils::url_extension,
    },
};
use serde::{Deserialize, Serialize};

use crate::utils::filename::sanitize_filename;

fn default_page() -> u32 {
    1
}

/// One downloadable unit: a single page of an upload.
///
/// `location` is empty until the item has been fully acquired. Once set it is
/// never cleared by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub identifier: String,
    pub content_key: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub part: String,
    #[serde(default = "default_page")]
    pub page: u32,
    pub author: String,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<Qn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<Qn>,
    #[serde(default, rename = "videoURL", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, rename = "audioURL", skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, rename = "directURL", skip_serializing_if = "Option::is_none")]
    pub direct_url: Option<String>,
    #[serde(default)]
    pub location: String,
}

impl MediaItem {
    /// Build an unresolved item for one page of an upload.
    pub fn from_page(view: &VideoView, page: &VideoPage) -> Self {
        Self {
            identifier: view.bvid.clone(),
            content_key: page.cid,
            aid: Some(view.aid),
            title: view.title.clone(),
            part: page.part.clone(),
            page: page.page,
            author: view.owner.name.clone(),
            duration: Some(page.duration).filter(|d| *d > 0),
            published_at: DateTime::from_timestamp(view.pubdate, 0).unwrap_or_default(),
            video_quality: None,
            audio_quality: None,
            video_url: None,
            audio_url: None,
            direct_url: None,
            location: String::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.location.is_empty()
    }

    /// Previously resolved streams, if the cached fields describe a full resolution.
    pub fn cached_streams(&self) -> Option<ResolvedStreams> {
        use platforms_parser::{Representation, StreamKind};

        if let (Some(video_url), Some(audio_url)) = (&self.video_url, &self.audio_url) {
            return Some(ResolvedStreams::Dual {
                video: Representation::new(
                    StreamKind::Video,
                    self.video_quality.unwrap_or(Qn::ANY),
                    video_url.clone(),
                ),
                audio: Representation::new(
                    StreamKind::Audio,
                    self.audio_quality.unwrap_or(Qn::ANY),
                    audio_url.clone(),
                ),
            });
        }

        self.direct_url.as_ref().map(|url| ResolvedStreams::Direct {
            url: url.clone(),
            quality: self.video_quality,
        })
    }

    /// Record a resolution. Dual and direct fields are mutually exclusive.
    pub fn set_resolution(&mut self, streams: &ResolvedStreams) {
        match streams {
            ResolvedStreams::Dual { video, audio } => {
                self.video_quality = Some(video.quality);
                self.audio_quality = Some(audio.quality);
                self.video_url = Some(video.url.clone());
                self.audio_url = Some(audio.url.clone());
                self.direct_url = None;
            }
            ResolvedStreams::Direct { url, quality } => {
                self.video_quality = *quality;
                self.audio_quality = None;
                self.video_url = None;
                self.audio_url = None;
                self.direct_url = Some(url.clone());
            }
        }
    }

    /// Directory under the author directory holding every page of this upload.
    pub fn title_dir(&self) -> String {
        sanitize_filename(&self.title)
    }

    /// Base name of this page's output file. Falls back to the title when
    /// the page has no part name.
    pub fn part_stem(&self) -> String {
        let part = self.part.trim();
        if part.is_empty() {
            sanitize_filename(&self.title)
        } else {
            sanitize_filename(part)
        }
    }

    /// Final file path relative to the author directory.
    ///
    /// `<title>/<part>[1080P,192K].mp4` for a remuxed pair and
    /// `<title>/<part>.<ext>` for a direct file. With `disambiguate` the
    /// content key is appended to the part, so the path is unique within a
    /// catalog.
    pub fn output_relative_path(&self, streams: &ResolvedStreams, disambiguate: bool) -> PathBuf {
        let mut stem = self.part_stem();
        if disambiguate {
            stem = format!("{stem} ({})", self.content_key);
        }
        let file_name = match streams {
            ResolvedStreams::Dual { video, audio } => {
                format!("{stem}[{},{}].mp4", video.quality, audio.quality)
            }
            ResolvedStreams::Direct { url, .. } => {
                let ext = url_extension(url).unwrap_or_else(|| "mp4".to_string());
                format!("{stem}.{ext}")
            }
        };
        Path::new(&self.title_dir()).join(file_name)
    }
}

/// Per-author inventory, unique by content key and ordered by publication time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub author: String,
    pub items: Vec<MediaItem>,
}

impl Catalog {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(author: impl Into<String>, items: Vec<MediaItem>) -> Self {
        let mut catalog = Self::new(author);
        catalog.merge(items);
        catalog
    }

    pub fn contains(&self, content_key: u64) -> bool {
        self.items.iter().any(|i| i.content_key == content_key)
    }

    /// Append items whose content key is not yet present, then re-sort by
    /// publication time (stable). Existing records are never overwritten.
    ///
    /// Returns the number of items added.
    pub fn merge(&mut self, items: impl IntoIterator<Item = MediaItem>) -> usize {
        let mut added = 0;
        for item in items {
            if self.contains(item.content_key) {
                continue;
            }
            self.items.push(item);
            added += 1;
        }
        if added > 0 {
            self.items.sort_by_key(|i| i.published_at);
        }
        added
    }

    /// Whether a completed record other than `content_key` already owns `path`.
    pub fn is_claimed(&self, path: &Path, content_key: u64) -> bool {
        self.items.iter().any(|i| {
            i.content_key != content_key && i.is_complete() && Path::new(&i.location) == path
        })
    }

    /// Where `item` should be written under `dir`.
    ///
    /// The plain `<title>/<part>` path is used unless another completed record
    /// already owns it, in which case the content key disambiguates. `None`
    /// when both candidates are taken.
    pub fn output_path_for(
        &self,
        item: &MediaItem,
        streams: &ResolvedStreams,
        dir: &Path,
    ) -> Option<PathBuf> {
        [false, true]
            .into_iter()
            .map(|disambiguate| dir.join(item.output_relative_path(streams, disambiguate)))
            .find(|path| !self.is_claimed(path, item.content_key))
    }

    pub fn completed(&self) -> usize {
        self.items.iter().filter(|i| i.is_complete()).count()
    }

    pub fn pending(&self) -> usize {
        self.items.len() - self.completed()
    }
}
