use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Quality rank of a stream representation (`qn` / DASH `id`).
///
/// Higher is better within one stream kind. Video and audio ranks live in
/// disjoint numeric ranges but nothing here relies on that; the stream kind is
/// carried separately by [`crate::media::Representation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qn(pub u32);

impl Qn {
    // 视频
    pub const P240: Qn = Qn(6);
    pub const P360: Qn = Qn(16);
    pub const P480: Qn = Qn(32);
    pub const P720: Qn = Qn(64);
    pub const P720_60: Qn = Qn(74);
    pub const P1080: Qn = Qn(80);
    pub const P1080_PLUS: Qn = Qn(112);
    pub const P1080_60: Qn = Qn(116);
    pub const P4K: Qn = Qn(120);
    pub const HDR: Qn = Qn(125);
    pub const DOLBY_VISION: Qn = Qn(126);
    pub const P8K: Qn = Qn(127);

    // 音频
    pub const AUDIO_64K: Qn = Qn(30216);
    pub const AUDIO_132K: Qn = Qn(30232);
    pub const AUDIO_192K: Qn = Qn(30280);
    pub const AUDIO_DOLBY: Qn = Qn(30250);
    pub const AUDIO_HI_RES: Qn = Qn(30251);

    /// Rank requested from the play-url endpoint when no preference is set.
    /// `0` lets the platform return every representation the session may access.
    pub const ANY: Qn = Qn(0);

    pub fn value(self) -> u32 {
        self.0
    }

    /// Human readable label, used in output file names.
    pub fn label(self) -> String {
        let label = match self {
            Qn::P240 => "240P",
            Qn::P360 => "360P",
            Qn::P480 => "480P",
            Qn::P720 => "720P",
            Qn::P720_60 => "720P60",
            Qn::P1080 => "1080P",
            Qn::P1080_PLUS => "1080P+",
            Qn::P1080_60 => "1080P60",
            Qn::P4K => "4K",
            Qn::HDR => "HDR",
            Qn::DOLBY_VISION => "DolbyVision",
            Qn::P8K => "8K",
            Qn::AUDIO_64K => "64K",
            Qn::AUDIO_132K => "132K",
            Qn::AUDIO_192K => "192K",
            Qn::AUDIO_DOLBY => "Dolby",
            Qn::AUDIO_HI_RES => "Hi-Res",
            Qn(other) => return format!("Q{other}"),
        };
        label.to_string()
    }
}

impl From<u32> for Qn {
    fn from(value: u32) -> Self {
        Qn(value)
    }
}

impl Display for Qn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Bit flags for the `fnval` play-url parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnval(pub u32);

impl Fnval {
    pub const MP4: Fnval = Fnval(1);
    pub const DASH: Fnval = Fnval(16);
    pub const HDR: Fnval = Fnval(64);
    pub const FOUR_K: Fnval = Fnval(128);

    pub fn with(self, other: Fnval) -> Fnval {
        Fnval(self.0 | other.0)
    }
}

impl Display for Fnval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
