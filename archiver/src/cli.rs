use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "bili-archiver",
    version,
    about = "Archive Bilibili uploads into per-author catalogs",
    long_about = "Search Bilibili, record found uploads in a per-author videos.yaml catalog, \
                  and download every pending entry at the highest available quality. \
                  Progress is saved after each item, so interrupted runs resume where they stopped."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to <config dir>/bili-archiver/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding one folder per author
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    /// Session cookies, e.g. "SESSDATA=...; bili_jct=..."
    #[arg(long, global = true)]
    pub cookies: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// API request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search uploads by keyword and add new ones to their authors' catalogs
    Search {
        keyword: String,

        /// Maximum number of result pages to walk
        #[arg(long)]
        max_pages: Option<u32>,

        /// Do not resolve stream URLs while adding items
        #[arg(long)]
        no_resolve: bool,

        /// Keep only uploads whose author name equals the keyword
        #[arg(long)]
        only_author: bool,
    },

    /// Download every pending item in an author's catalog
    #[command(name = "download-uper", alias = "downloaduper")]
    DownloadUper {
        author: String,

        /// Resolve stream URLs again instead of using cached ones
        #[arg(long)]
        refresh: bool,
    },

    /// Download a single upload by BV id or URL, without touching any catalog
    Download {
        /// BV id or video URL
        id: String,

        /// Page number for multi-part uploads
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Output directory (defaults to <output root>/<author>)
        #[arg(short = 'd', long)]
        dir: Option<PathBuf>,

        /// Final file path, overriding the generated name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show an author's catalog and acquisition status
    List {
        author: String,

        /// Only show items that have not been acquired
        #[arg(long)]
        pending: bool,
    },
}

impl Args {
    /// Apply command-line overrides on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(cookies) = &self.cookies {
            config.cookies = Some(cookies.clone());
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg_path = ffmpeg.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_download_uper_alias() {
        let args =
            Args::try_parse_from(["bili-archiver", "downloaduper", "碧诗", "--refresh"]).unwrap();
        match args.command {
            Commands::DownloadUper { author, refresh } => {
                assert_eq!(author, "碧诗");
                assert!(refresh);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "bili-archiver",
            "--output-root",
            "/srv/bili",
            "list",
            "碧诗",
            "--ffmpeg",
            "/opt/ffmpeg",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.output_root, PathBuf::from("/srv/bili"));
        assert_eq!(config.ffmpeg_path, "/opt/ffmpeg");
    }
}
