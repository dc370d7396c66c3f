//! Per-file deadline for blocking engine calls.

use crate::error::{Result, SweepError};
use crossbeam_channel::RecvTimeoutError;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Runs `job`, giving up after `timeout`.
///
/// Without a timeout the job runs on the calling thread. With one, it runs on
/// a worker thread; on expiry the worker is abandoned (it keeps whatever it
/// captured until it finishes) and [`SweepError::Timeout`] is returned.
/// A panicking job becomes an error for `item` on either path.
pub fn run_with_deadline<T, F>(item: &str, timeout: Option<Duration>, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let Some(limit) = timeout else {
        return match std::panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(result) => result,
            Err(_) => Err(SweepError::Other(format!("Worker for {} panicked", item))),
        };
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    let worker_item = item.to_string();
    std::thread::Builder::new()
        .name(format!("sweep-worker:{}", item))
        .spawn(move || {
            if tx.send(job()).is_err() {
                tracing::debug!(file = %worker_item, "Worker finished after its deadline");
            }
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(SweepError::Timeout {
            item: item.to_string(),
            timeout: limit,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(SweepError::Other(format!(
            "Worker for {} stopped without a result",
            item
        ))),
    }
}
