//! bili-archiver library crate.
//!
//! Discovers uploads on Bilibili, keeps a per-author YAML catalog of them, and
//! acquires each pending item by resolving its streams, downloading the video
//! and audio tracks, and remuxing them with ffmpeg. Progress is persisted after
//! every item so interrupted runs resume where they stopped.

pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod remux;
pub mod resolver;
pub mod utils;

pub use error::{Error, Result};
