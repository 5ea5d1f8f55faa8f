use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
    USER_AGENT,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{default::DEFAULT_UA, error::ExtractorError};

/// Shared HTTP plumbing for a platform API: fixed headers plus a cookie jar.
///
/// ```rust,no_run
/// # use platforms_parser::extractor::{default_client, platform_extractor::Extractor};
/// # async fn doc_test() -> Result<(), Box<dyn std::error::Error>> {
/// let mut extractor = Extractor::new("Bilibili", default_client()?);
/// extractor.set_cookies_from_string("SESSDATA=abc123; bili_jct=xyz789");
/// let view: serde_json::Value = extractor
///     .get_json("https://api.bilibili.com/x/web-interface/view", &[("bvid", "BV1xx411c7mD".into())])
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    pub platform_name: String,
    pub client: Client,
    headers: HeaderMap,
    cookies: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new(platform_name: impl Into<String>, client: Client) -> Self {
        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        // Accept-Encoding is left to reqwest so bodies get decompressed.

        Self {
            platform_name: platform_name.into(),
            client,
            headers,
            cookies: FxHashMap::default(),
        }
    }

    /// Send `Origin` and `Referer` as the platform's web front end.
    pub fn set_origin_and_referer_static(&mut self, base_url: &'static str) {
        let value = HeaderValue::from_static(base_url);
        self.insert_header(ORIGIN, value.clone());
        self.insert_header(REFERER, value);
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Merge cookies from a `name=value; name2=value2` string.
    ///
    /// Newlines are accepted as separators too. Fragments without a name or a
    /// value are ignored.
    pub fn set_cookies_from_string(&mut self, cookie_string: &str) {
        let pairs = cookie_string
            .split([';', '\n'])
            .filter_map(|part| part.split_once('='))
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, value)| !name.is_empty() && !value.is_empty());

        for (name, value) in pairs {
            self.cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        HeaderValue::from_str(&joined)
            .inspect_err(|e| debug!(error = %e, "Cookie header rejected, sending none"))
            .ok()
    }

    /// GET request carrying the platform headers and cookies.
    pub fn get(&self, url: &str) -> RequestBuilder {
        let mut headers = self.headers.clone();
        if let Some(cookie) = self.cookie_header() {
            headers.insert(COOKIE, cookie);
        }
        self.client.get(url).headers(headers)
    }

    /// GET with query parameters, decoding the JSON body.
    ///
    /// Any status other than `200 OK` becomes
    /// [`ExtractorError::UnexpectedStatus`] and the body is not read.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExtractorError> {
        let response = ensure_ok(self.get(url).query(query).send().await?)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Reject any response whose status is not exactly `200 OK`.
pub fn ensure_ok(response: Response) -> Result<Response, ExtractorError> {
    match response.status() {
        StatusCode::OK => Ok(response),
        status => Err(ExtractorError::UnexpectedStatus(status.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default_client;

    #[test]
    fn test_cookie_string_parsing() {
        let mut extractor = Extractor::new("Test", default_client().unwrap());
        extractor.set_cookies_from_string("SESSDATA=abc; ;broken; buvid3=xyz\nbili_jct= 123 ");

        assert_eq!(extractor.get_cookie("SESSDATA"), Some("abc"));
        assert_eq!(extractor.get_cookie("buvid3"), Some("xyz"));
        assert_eq!(extractor.get_cookie("bili_jct"), Some("123"));
        assert!(!extractor.has_cookie("broken"));
    }

    #[test]
    fn test_cookie_header() {
        let mut extractor = Extractor::new("Test", default_client().unwrap());
        assert!(extractor.cookie_header().is_none());

        extractor.add_cookie("buvid3", "abc-infoc");
        assert_eq!(extractor.cookie_header().unwrap(), "buvid3=abc-infoc");
    }
}
