mod builder;
pub mod models;
mod quality;
mod utils;

pub use builder::{Bilibili, select_streams};
pub use quality::{Fnval, Qn};
pub use utils::{BVID_REGEX, extract_bvid, generate_fake_buvid3, strip_highlight};
