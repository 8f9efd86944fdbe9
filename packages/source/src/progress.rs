//! Progress reporting trait for downloads.
//!
//! [`ProgressCallback`] keeps the fetcher independent of how progress is
//! shown: the CLI plugs in `indicatif` bars, tests use [`NullProgress`].

/// Receives progress updates from a long-running transfer.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total expected bytes (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` bytes.
    fn inc(&self, delta: u64);

    /// Updates the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the transfer complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
