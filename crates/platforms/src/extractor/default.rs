use std::{sync::OnceLock, time::Duration};

use reqwest::Client;
use tracing::debug;

use super::error::ExtractorError;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Install the aws-lc-rs rustls provider once per process.
///
/// reqwest is built without a bundled provider, so this must run before any
/// client is constructed.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build an HTTP client with the given request timeout.
///
/// The timeout bounds the whole request including the body, so clients used
/// for large media transfers should pass `None`.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, ExtractorError> {
    install_rustls_provider();

    let mut builder = Client::builder()
        .use_rustls_tls()
        .user_agent(DEFAULT_UA)
        .connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Client used for API requests.
pub fn default_client() -> Result<Client, ExtractorError> {
    build_client(Some(DEFAULT_TIMEOUT))
}
