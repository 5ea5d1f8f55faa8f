pub mod default;
pub mod error;
pub mod platform_extractor;
pub mod platforms;
pub mod utils;

pub use default::{build_client, default_client, install_rustls_provider};
