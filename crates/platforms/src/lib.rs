//! Typed client for the Bilibili video-on-demand web API.
//!
//! Covers upload metadata (`view`), stream resolution (`playurl`) and keyword
//! search, plus the representation types used to pick a stream pair.

pub mod extractor;
pub mod media;

pub use extractor::error::ExtractorError;
pub use extractor::platforms::bilibili::{Bilibili, Fnval, Qn};
pub use media::{Representation, ResolvedStreams, StreamKind};
