use thiserror::Error;

/// Platform error code returned when the session cookie is missing or expired.
pub const API_CODE_NOT_LOGGED_IN: i64 = -101;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid video id: {0}")]
    InvalidVideoId(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("api error {code}: {message}")]
    ApiError { code: i64, message: String },
    #[error("missing field in response: {0}")]
    MissingData(&'static str),
    #[error("no streams found")]
    NoStreamsFound,
    #[error("page {page} not found, upload has {available} page(s)")]
    PageNotFound { page: u32, available: usize },
    #[error("other: {0}")]
    Other(String),
}

impl ExtractorError {
    /// Whether the platform rejected the request because no valid session was attached.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::ApiError { code, .. } if *code == API_CODE_NOT_LOGGED_IN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_display() {
        assert_eq!(
            ExtractorError::UnexpectedStatus(403).to_string(),
            "unexpected status: 403"
        );
    }

    #[test]
    fn test_auth_required() {
        let err = ExtractorError::ApiError {
            code: -101,
            message: "账号未登录".to_string(),
        };
        assert!(err.is_auth_required());

        let err = ExtractorError::ApiError {
            code: -404,
            message: "啥都木有".to_string(),
        };
        assert!(!err.is_auth_required());
    }
}
