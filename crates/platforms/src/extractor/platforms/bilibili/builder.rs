use reqwest::Client;
use tracing::debug;

use crate::{
    extractor::{
        error::ExtractorError,
        platform_extractor::Extractor,
        platforms::bilibili::{
            models::{ApiResponse, DashStream, PlayUrlData, SearchData, SearchResult, VideoView},
            quality::{Fnval, Qn},
            utils::generate_fake_buvid3,
        },
    },
    media::{Representation, ResolvedStreams, StreamKind, select_highest},
};

/// Client for the Bilibili video-on-demand web API.
#[derive(Debug, Clone)]
pub struct Bilibili {
    pub extractor: Extractor,
    api_base: String,
}

impl Bilibili {
    pub const BASE_URL: &str = "https://www.bilibili.com";

    pub const API_BASE: &str = "https://api.bilibili.com";

    const VIEW_PATH: &str = "/x/web-interface/view";

    const PLAY_URL_PATH: &str = "/x/player/playurl";

    const SEARCH_PATH: &str = "/x/web-interface/search/type";

    /// Cookie holding the login session.
    pub const SESSION_COOKIE: &str = "SESSDATA";

    pub fn new(client: Client, cookies: Option<&str>) -> Self {
        let mut extractor = Extractor::new("Bilibili", client);

        if let Some(cookies) = cookies {
            extractor.set_cookies_from_string(cookies);
        }
        if !extractor.has_cookie("buvid3") {
            extractor.add_cookie("buvid3", generate_fake_buvid3());
        }
        extractor.set_origin_and_referer_static(Self::BASE_URL);

        Self {
            extractor,
            api_base: Self::API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.extractor.has_cookie(Self::SESSION_COOKIE)
    }

    async fn get_bilibili_api<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T, ExtractorError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(url = %url, params = ?params, "bilibili api request");

        let json: ApiResponse<T> = self.extractor.get_json(&url, &params).await?;
        json.into_data()
    }

    /// Fetch upload metadata, including its pages.
    pub async fn video_info(&self, bvid: &str) -> Result<VideoView, ExtractorError> {
        let params = vec![("bvid", bvid.to_string())];
        self.get_bilibili_api(Self::VIEW_PATH, params).await
    }

    /// Query the stream representations available for one page of an upload.
    pub async fn play_url(
        &self,
        bvid: &str,
        cid: u64,
        qn: Qn,
        fnval: Fnval,
    ) -> Result<PlayUrlData, ExtractorError> {
        let params = vec![
            ("bvid", bvid.to_string()),
            ("cid", cid.to_string()),
            ("qn", qn.value().to_string()),
            ("fnval", fnval.to_string()),
            ("fnver", "0".to_string()),
            ("fourk", "1".to_string()),
        ];
        self.get_bilibili_api(Self::PLAY_URL_PATH, params).await
    }

    /// One page of keyword search results, newest first.
    ///
    /// An empty vector means the page is past the end of the results.
    pub async fn search_videos(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<SearchResult>, ExtractorError> {
        let params = vec![
            ("search_type", "video".to_string()),
            ("keyword", keyword.to_string()),
            ("order", "pubdate".to_string()),
            ("page", page.to_string()),
        ];
        let data: SearchData = self.get_bilibili_api(Self::SEARCH_PATH, params).await?;
        debug!(page = data.page, num_pages = data.num_pages, "search page fetched");
        Ok(data.result.unwrap_or_default())
    }

    /// Resolve the best DASH pair (or single direct file) for one page.
    pub async fn resolve_streams(
        &self,
        bvid: &str,
        cid: u64,
    ) -> Result<ResolvedStreams, ExtractorError> {
        let fnval = Fnval::DASH.with(Fnval::FOUR_K);
        let data = self.play_url(bvid, cid, Qn::ANY, fnval).await?;
        select_streams(data)
    }
}

/// Choose representations from a play-url payload.
///
/// DASH wins when it has both a video and an audio track; otherwise the first
/// `durl` entry is used as a direct file.
pub fn select_streams(data: PlayUrlData) -> Result<ResolvedStreams, ExtractorError> {
    if let Some(dash) = data.dash {
        let video = select_highest(
            dash.video
                .unwrap_or_default()
                .into_iter()
                .map(|s| to_representation(StreamKind::Video, s)),
        );
        let audio = select_highest(
            dash.audio
                .unwrap_or_default()
                .into_iter()
                .map(|s| to_representation(StreamKind::Audio, s)),
        );

        match (video, audio) {
            (Some(video), Some(audio)) => return Ok(ResolvedStreams::Dual { video, audio }),
            (video, audio) => debug!(
                has_video = video.is_some(),
                has_audio = audio.is_some(),
                "incomplete dash payload, falling back to durl"
            ),
        }
    }

    let durl = data
        .durl
        .unwrap_or_default()
        .into_iter()
        .min_by_key(|d| d.order)
        .ok_or(ExtractorError::NoStreamsFound)?;

    let quality = (data.quality != 0).then_some(Qn(data.quality));
    Ok(ResolvedStreams::Direct {
        url: durl.url,
        quality,
    })
}

fn to_representation(
    kind: StreamKind,
    stream: DashStream,
) -> Representation {
    Representation {
        kind,
        quality: Qn(stream.id),
        url: stream.base_url,
        backup_urls: stream.backup_url.unwrap_or_default(),
        bandwidth: stream.bandwidth,
        codecs: stream.codecs,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;
    use crate::extractor::default::default_client;

    fn client(server: &MockServer) -> Bilibili {
        Bilibili::new(default_client().unwrap(), Some("SESSDATA=token")).with_api_base(server.uri())
    }

    fn play_url_fixture() -> serde_json::Value {
        json!({
            "code": 0, "message": "0", "ttl": 1,
            "data": {
                "quality": 80,
                "dash": {
                    "video": [
                        {"id": 6, "base_url": "https://v/6.m4s", "bandwidth": 100, "codecs": "avc1"},
                        {"id": 80, "base_url": "https://v/80.m4s", "bandwidth": 900, "codecs": "avc1"},
                        {"id": 64, "base_url": "https://v/64.m4s", "bandwidth": 500, "codecs": "avc1"}
                    ],
                    "audio": [
                        {"id": 30216, "base_url": "https://a/30216.m4s", "bandwidth": 64000},
                        {"id": 30280, "base_url": "https://a/30280.m4s", "bandwidth": 192000}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_select_streams_durl_only() {
        let data: PlayUrlData = serde_json::from_value(json!({
            "quality": 64,
            "durl": [{"order": 1, "url": "https://d/full.flv", "size": 1000, "length": 60000}]
        }))
        .unwrap();

        match select_streams(data).unwrap() {
            ResolvedStreams::Direct { url, quality } => {
                assert_eq!(url, "https://d/full.flv");
                assert_eq!(quality, Some(Qn::P720));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_select_streams_nothing() {
        let data = PlayUrlData::default();
        assert!(matches!(
            select_streams(data),
            Err(ExtractorError::NoStreamsFound)
        ));
    }

    #[test]
    fn test_select_streams_dash_without_audio_falls_back() {
        let data: PlayUrlData = serde_json::from_value(json!({
            "dash": {"video": [{"id": 80, "base_url": "https://v/80.m4s"}], "audio": null},
            "durl": [{"order": 1, "url": "https://d/full.mp4"}]
        }))
        .unwrap();
        assert!(matches!(
            select_streams(data).unwrap(),
            ResolvedStreams::Direct { .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_streams_picks_highest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/player/playurl"))
            .and(query_param("bvid", "BV1xx411c7mD"))
            .and(query_param("cid", "62131"))
            .and(query_param("fnval", "144"))
            .respond_with(ResponseTemplate::new(200).set_body_json(play_url_fixture()))
            .mount(&server)
            .await;

        let streams = client(&server)
            .resolve_streams("BV1xx411c7mD", 62131)
            .await
            .unwrap();

        match streams {
            ResolvedStreams::Dual { video, audio } => {
                assert_eq!(video.kind, StreamKind::Video);
                assert_eq!(video.quality, Qn::P1080);
                assert_eq!(video.url, "https://v/80.m4s");
                assert_eq!(audio.kind, StreamKind::Audio);
                assert_eq!(audio.quality, Qn::AUDIO_192K);
                assert_eq!(audio.url, "https://a/30280.m4s");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/view"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": -101, "message": "账号未登录", "ttl": 1, "data": null
            })))
            .mount(&server)
            .await;

        let err = client(&server).video_info("BV1xx411c7mD").await.unwrap_err();
        assert!(err.is_auth_required());
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/view"))
            .respond_with(ResponseTemplate::new(412))
            .mount(&server)
            .await;

        let err = client(&server).video_info("BV1xx411c7mD").await.unwrap_err();
        assert!(matches!(err, ExtractorError::UnexpectedStatus(412)));
        assert_eq!(err.to_string(), "unexpected status: 412");
    }

    #[tokio::test]
    async fn test_search_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/search/type"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "message": "0", "ttl": 1,
                "data": {"page": 3, "numPages": 2}
            })))
            .mount(&server)
            .await;

        let results = client(&server).search_videos("测试", 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/web-interface/search/type"))
            .and(query_param("keyword", "测试"))
            .and(query_param("order", "pubdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0, "message": "0", "ttl": 1,
                "data": {"page": 1, "numPages": 1, "result": [
                    {"bvid": "BV1xx411c7mD", "aid": 2, "author": "碧诗", "mid": 2,
                     "title": "<em class=\"keyword\">测试</em>", "pubdate": 1248012000, "duration": "40:12"}
                ]}
            })))
            .mount(&server)
            .await;

        let results = client(&server).search_videos("测试", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].author, "碧诗");
    }

    #[test]
    fn test_fake_buvid3_cookie_added() {
        let bili = Bilibili::new(default_client().unwrap(), None);
        assert!(bili.extractor.has_cookie("buvid3"));
        assert!(!bili.is_logged_in());
    }

    #[tokio::test]
    #[ignore]
    async fn test_video_info_live() {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
        let bili = Bilibili::new(default_client().unwrap(), None);
        let view = bili.video_info("BV1xx411c7mD").await.unwrap();
        println!("{view:?}");
    }
}
