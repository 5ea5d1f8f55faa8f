use serde::Deserialize;

use crate::extractor::error::ExtractorError;

/// Common `{code, message, data}` envelope of the web API.
///
/// A non-zero `code` is an application error even when the HTTP status is 200.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ttl: i64,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Result<T, ExtractorError> {
        if self.code != 0 {
            return Err(ExtractorError::ApiError {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or(ExtractorError::MissingData("data"))
    }
}

/// `x/web-interface/view` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoView {
    pub bvid: String,
    pub aid: u64,
    pub title: String,
    /// Unix seconds.
    pub pubdate: i64,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    pub owner: VideoOwner,
    #[serde(default)]
    pub pages: Vec<VideoPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoOwner {
    pub mid: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoPage {
    pub cid: u64,
    pub page: u32,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: u64,
}

/// `x/player/playurl` payload. Exactly one of `dash` / `durl` is normally populated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayUrlData {
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub accept_quality: Vec<u32>,
    #[serde(default)]
    pub dash: Option<Dash>,
    #[serde(default)]
    pub durl: Option<Vec<Durl>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dash {
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub video: Option<Vec<DashStream>>,
    #[serde(default)]
    pub audio: Option<Vec<DashStream>>,
}

// The API sends both `base_url` and `baseUrl`; only the snake_case keys are read.
#[derive(Debug, Clone, Deserialize)]
pub struct DashStream {
    pub id: u32,
    pub base_url: String,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub codecs: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Durl {
    #[serde(default)]
    pub order: u32,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    /// Milliseconds.
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub backup_url: Option<Vec<String>>,
}

/// `x/web-interface/search/type?search_type=video` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "numPages")]
    pub num_pages: u32,
    #[serde(default)]
    pub result: Option<Vec<SearchResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub bvid: String,
    #[serde(default)]
    pub aid: u64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub mid: u64,
    /// May contain `<em class="keyword">` highlight tags.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pubdate: i64,
    /// "mm:ss" or "h:mm:ss".
    #[serde(default)]
    pub duration: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error() {
        let json = r#"{"code":-404,"message":"啥都木有","ttl":1,"data":null}"#;
        let resp: ApiResponse<VideoView> = serde_json::from_str(json).unwrap();
        match resp.into_data() {
            Err(ExtractorError::ApiError { code, message }) => {
                assert_eq!(code, -404);
                assert_eq!(message, "啥都木有");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let json = r#"{"code":0,"message":"0","ttl":1}"#;
        let resp: ApiResponse<VideoView> = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_data(),
            Err(ExtractorError::MissingData("data"))
        ));
    }

    #[test]
    fn test_view_parse() {
        let json = r#"{
            "code": 0, "message": "0", "ttl": 1,
            "data": {
                "bvid": "BV1xx411c7mD", "aid": 2, "title": "字幕君交流场所",
                "pubdate": 1248012000, "duration": 2412,
                "owner": {"mid": 2, "name": "碧诗", "face": "x"},
                "pages": [
                    {"cid": 62131, "page": 1, "part": "P1", "duration": 1206},
                    {"cid": 62132, "page": 2, "part": "P2", "duration": 1206}
                ]
            }
        }"#;
        let resp: ApiResponse<VideoView> = serde_json::from_str(json).unwrap();
        let view = resp.into_data().unwrap();
        assert_eq!(view.owner.name, "碧诗");
        assert_eq!(view.pages.len(), 2);
        assert_eq!(view.pages[1].cid, 62132);
    }

    #[test]
    fn test_dash_parse_with_duplicate_keys() {
        let json = r#"{
            "quality": 80, "format": "flv", "accept_quality": [80, 64, 32, 16],
            "dash": {
                "duration": 120,
                "video": [{
                    "id": 80, "base_url": "https://v/80.m4s", "baseUrl": "https://v/80.m4s",
                    "backup_url": ["https://b/80.m4s"], "backupUrl": ["https://b/80.m4s"],
                    "bandwidth": 1000, "mime_type": "video/mp4", "mimeType": "video/mp4",
                    "codecs": "avc1.640032", "width": 1920, "height": 1080
                }],
                "audio": null
            }
        }"#;
        let data: PlayUrlData = serde_json::from_str(json).unwrap();
        let dash = data.dash.unwrap();
        assert_eq!(dash.video.unwrap()[0].base_url, "https://v/80.m4s");
        assert!(dash.audio.is_none());
        assert!(data.durl.is_none());
    }
}
