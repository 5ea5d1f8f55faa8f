pub mod progress;
pub mod transfer;

pub use progress::{IndicatifProgress, ProgressHandle, ProgressSink};
pub use transfer::{HttpTransfer, TransferEngine};
