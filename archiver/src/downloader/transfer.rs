//! HTTP transfer of a single elementary stream to a local file.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::HumanBytes;
use platforms_parser::Bilibili;
use reqwest::{
    Client, StatusCode,
    header::{HeaderValue, REFERER},
};
use tokio::{io::AsyncWriteExt, sync::watch};
use tracing::{debug, info};

use super::progress::ProgressSink;
use crate::{Error, Result, utils::fs::io_error};

/// Downloads one URL into a caller-owned destination file.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Returns the number of bytes written.
    async fn fetch(&self, label: &str, url: &str, destination: &Path) -> Result<u64>;
}

#[async_trait]
impl<T: TransferEngine + ?Sized> TransferEngine for Arc<T> {
    async fn fetch(&self, label: &str, url: &str, destination: &Path) -> Result<u64> {
        (**self).fetch(label, url, destination).await
    }
}

/// Streaming HTTP transfer with the platform referer attached.
pub struct HttpTransfer {
    client: Client,
    referer: HeaderValue,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl HttpTransfer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            referer: HeaderValue::from_static(Bilibili::BASE_URL),
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Render byte counts from `rx` on a separate task so the copy loop never
    /// waits on the observer.
    fn spawn_observer(
        &self,
        label: &str,
        total: Option<u64>,
        mut rx: watch::Receiver<u64>,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let sink = self.progress.clone()?;
        let label = label.to_string();
        Some(tokio::spawn(async move {
            let handle = sink.start(&label, total);
            while rx.changed().await.is_ok() {
                let bytes = *rx.borrow_and_update();
                handle.update(bytes);
            }
            handle.update(*rx.borrow());
            handle.finish();
        }))
    }
}

#[async_trait]
impl TransferEngine for HttpTransfer {
    async fn fetch(&self, label: &str, url: &str, destination: &Path) -> Result<u64> {
        debug!(label = %label, url = %url, "Starting transfer");

        let response = self
            .client
            .get(url)
            .header(REFERER, self.referer.clone())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        let expected = response.content_length();
        if let Some(len) = expected {
            info!(label = %label, size = %HumanBytes(len), "Transfer started");
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| io_error("creating file", destination, e))?;

        let (tx, rx) = watch::channel(0u64);
        let observer = self.spawn_observer(label, expected, rx);

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        let copy_result: Result<()> = async {
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    // A body cut off before its declared length is a short read.
                    Err(e) => match expected {
                        Some(expected) if written < expected => {
                            debug!(label = %label, error = %e, "Body ended early");
                            return Err(Error::ShortRead {
                                expected,
                                actual: written,
                            });
                        }
                        _ => return Err(e.into()),
                    },
                };
                file.write_all(&chunk)
                    .await
                    .map_err(|e| io_error("writing file", destination, e))?;
                written += chunk.len() as u64;
                tx.send_replace(written);
            }
            file.flush()
                .await
                .map_err(|e| io_error("flushing file", destination, e))?;
            file.sync_all()
                .await
                .map_err(|e| io_error("syncing file", destination, e))?;
            Ok(())
        }
        .await;

        drop(tx);
        if let Some(observer) = observer {
            let _ = observer.await;
        }
        copy_result?;

        if let Some(expected) = expected
            && written != expected
        {
            return Err(Error::ShortRead {
                expected,
                actual: written,
            });
        }

        info!(label = %label, size = %HumanBytes(written), "Transfer finished");
        Ok(written)
    }
}
