//! Transfer progress observers.

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Receives cumulative byte counts for one transfer.
pub trait ProgressHandle: Send + Sync {
    fn update(&self, bytes: u64);
    fn finish(&self);
}

/// Creates a [`ProgressHandle`] per transfer.
pub trait ProgressSink: Send + Sync {
    fn start(&self, label: &str, total: Option<u64>) -> Box<dyn ProgressHandle>;
}

/// Terminal progress bars, one line per concurrent transfer.
#[derive(Debug, Clone, Default)]
pub struct IndicatifProgress {
    multi: MultiProgress,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for IndicatifProgress {
    fn start(&self, label: &str, total: Option<u64>) -> Box<dyn ProgressHandle> {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{msg:>12} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.blue} {msg:>12} {bytes} ({bytes_per_sec})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        let bar = self.multi.add(bar);
        bar.set_message(label.to_string());
        Box::new(IndicatifHandle { bar })
    }
}

struct IndicatifHandle {
    bar: ProgressBar,
}

impl ProgressHandle for IndicatifHandle {
    fn update(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
