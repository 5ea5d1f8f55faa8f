use std::sync::LazyLock;

use regex::Regex;

use crate::extractor::{error::ExtractorError, utils::capture_group_1_owned};

pub static BVID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(BV[0-9A-Za-z]{10})").unwrap());

static HIGHLIGHT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?em[^>]*>").unwrap());

/// Generates a fake BUVID3 identifier for Bilibili API requests.
///
/// The search endpoint rejects anonymous requests without one. The result
/// has the shape `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXXinfoc`.
pub fn generate_fake_buvid3() -> String {
    let u = uuid::Uuid::new_v4();
    let u_str = u.to_string().to_uppercase().replace('-', "");
    format!(
        "{}-{}-{}-{}-{}infoc",
        &u_str[0..8],
        &u_str[8..12],
        &u_str[12..16],
        &u_str[16..20],
        &u_str[20..]
    )
}

/// Extract a BV id from a bare id or any URL containing one.
pub fn extract_bvid(input: &str) -> Result<String, ExtractorError> {
    capture_group_1_owned(&BVID_REGEX, input.trim())
        .ok_or_else(|| ExtractorError::InvalidVideoId(input.to_string()))
}

/// Remove `<em class="keyword">` highlight markup and common HTML entities
/// from search result titles.
pub fn strip_highlight(title: &str) -> String {
    HIGHLIGHT_REGEX
        .replace_all(title, "")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_buvid3_shape() {
        let id = generate_fake_buvid3();
        assert!(id.ends_with("infoc"));
        assert_eq!(id.len(), 32 + 4 + 5);
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn test_extract_bvid() {
        assert_eq!(extract_bvid("BV1xx411c7mD").unwrap(), "BV1xx411c7mD");
        assert_eq!(
            extract_bvid("https://www.bilibili.com/video/BV1xx411c7mD/?p=2").unwrap(),
            "BV1xx411c7mD"
        );
        assert!(matches!(
            extract_bvid("av170001"),
            Err(ExtractorError::InvalidVideoId(_))
        ));
    }

    #[test]
    fn test_strip_highlight() {
        assert_eq!(
            strip_highlight(r#"【<em class="keyword">测试</em>】A &amp; B"#),
            "【测试】A & B"
        );
    }
}
