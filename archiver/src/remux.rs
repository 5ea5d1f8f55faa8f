//! Stream-copy remux of a video and an audio elementary stream into one container.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use process_utils::{probe_version, tool_command};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::OnceCell,
};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 32;

/// Combines two downloaded elementary streams into the final deliverable.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Returns the output path on success. Inputs are left in place.
    async fn remux(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf>;
}

#[async_trait]
impl<T: Remuxer + ?Sized> Remuxer for Arc<T> {
    async fn remux(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf> {
        (**self).remux(video, audio, output).await
    }
}

/// `ffmpeg -y -i <video> -i <audio> -c copy -shortest <output>`.
///
/// The binary is probed on first use, so runs that never remux do not need it.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    version: OnceCell<Option<String>>,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            version: OnceCell::new(),
        }
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// First line of `ffmpeg -version`, or `None` when the binary is unusable.
    /// The probe runs once per remuxer.
    pub async fn version(&self) -> Option<String> {
        self.version
            .get_or_init(|| probe_version(&self.ffmpeg_path))
            .await
            .clone()
    }

    pub async fn is_available(&self) -> bool {
        self.version().await.is_some()
    }

    fn build_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            "-shortest".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

/// Read a pipe to EOF, logging each line and keeping the last `keep` lines.
async fn drain_lines<R>(pipe: Option<R>, stream: &'static str, keep: usize) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(keep);
    let Some(pipe) = pipe else {
        return tail;
    };

    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(stream, "{}", line);
                if keep == 0 {
                    continue;
                }
                if tail.len() == keep {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(stream, error = %e, "Failed to read process output");
                break;
            }
        }
    }
    tail
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf> {
        if !self.is_available().await {
            return Err(Error::FfmpegMissing(self.ffmpeg_path.clone()));
        }

        let args = Self::build_args(video, audio, output);
        debug!(ffmpeg = %self.ffmpeg_path, args = ?args, "Running remux");

        let mut child = tool_command(&self.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        // Both pipes are drained concurrently before waiting, otherwise a full
        // stderr pipe would block ffmpeg forever.
        let (_, stderr_tail) = tokio::join!(
            drain_lines(child.stdout.take(), "stdout", 0),
            drain_lines(child.stderr.take(), "stderr", STDERR_TAIL_LINES),
        );

        let status = child.wait().await.map_err(|source| Error::Spawn {
            program: self.ffmpeg_path.clone(),
            source,
        })?;

        if !status.success() {
            let stderr = stderr_tail.into_iter().collect::<Vec<_>>().join("\n");
            warn!(status = %status, output = %output.display(), "Remux failed");
            return Err(Error::Remux {
                status: status.to_string(),
                stderr,
            });
        }

        info!(output = %output.display(), "Remux finished");
        Ok(output.to_path_buf())
    }
}
