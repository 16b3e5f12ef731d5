//! Transfer progress
//!
//! Progress is a percentage in `0..=100` published on a `watch` channel. Updates
//! only ever raise the value, so observers see a non-decreasing sequence no
//! matter how chunks are reported.

use std::sync::Arc;
use tokio::sync::watch;

/// Percentage of `total` covered by `sent`, clamped to 100. An unknown or empty
/// total reports 0 until the transfer completes.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (sent as u128 * 100) / total as u128;
    percent.min(100) as u8
}

/// Publisher side of a progress stream. Cheap to clone; all clones feed the same
/// channel.
#[derive(Clone, Debug)]
pub struct TransferProgress {
    tx: Arc<watch::Sender<u8>>,
}

impl TransferProgress {
    /// New progress stream starting at 0, with one receiver.
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Progress stream nobody listens to.
    pub fn discard() -> Self {
        Self::channel().0
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Raise progress to `percent`. Lower values are ignored.
    pub fn advance(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    pub fn complete(&self) {
        self.advance(100);
    }
}
