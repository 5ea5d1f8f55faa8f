use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractor::platforms::bilibili::Qn;

/// Kind of a media stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    /// One file carrying both tracks.
    Combined,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Combined => "combined",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quality variant of an elementary stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub kind: StreamKind,
    pub quality: Qn,
    pub url: String,
    pub backup_urls: Vec<String>,
    // Bits per second, used to break ties between equal ranks (e.g. codec variants)
    pub bandwidth: u64,
    pub codecs: String,
}

impl Representation {
    pub fn new(kind: StreamKind, quality: Qn, url: impl Into<String>) -> Self {
        Self {
            kind,
            quality,
            url: url.into(),
            backup_urls: Vec::new(),
            bandwidth: 0,
            codecs: String::new(),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.codecs.is_empty() {
            write!(f, "{} {}", self.kind, self.quality)
        } else {
            write!(f, "{} {} ({})", self.kind, self.quality, self.codecs)
        }
    }
}

/// Outcome of resolving one media item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStreams {
    /// Separate video and audio elementary streams that need a remux.
    Dual {
        video: Representation,
        audio: Representation,
    },
    /// A single pre-combined file.
    Direct { url: String, quality: Option<Qn> },
}

/// Pick the representation with the highest quality rank.
///
/// Ties are broken by bandwidth, then by the earliest entry.
pub fn select_highest<I>(representations: I) -> Option<Representation>
where
    I: IntoIterator<Item = Representation>,
{
    representations.into_iter().fold(None, |best, candidate| match best {
        Some(best)
            if (best.quality, best.bandwidth) >= (candidate.quality, candidate.bandwidth) =>
        {
            Some(best)
        }
        _ => Some(candidate),
    })
}
