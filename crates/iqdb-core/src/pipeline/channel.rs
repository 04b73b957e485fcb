//! Bounded fan-out for batch fingerprinting.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::config::PipelineConfig;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, senders wait, so a slow writer throttles the
/// workers instead of letting results pile up in memory.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size)
}

/// Run `task` over `items` with at most `workers` in flight.
///
/// Results arrive on the returned receiver in completion order, each paired
/// with the position of its item in `items`. The receiver closes once every
/// item has been processed or the receiver is dropped.
pub fn fan_out<I, O, F, Fut>(
    items: Vec<I>,
    workers: usize,
    config: &PipelineConfig,
    task: F,
) -> mpsc::Receiver<(usize, O)>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let (tx, rx) = bounded_channel(config);
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let task = Arc::new(task);

    tokio::spawn(async move {
        for (position, item) in items.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            if tx.is_closed() {
                break;
            }

            let tx = tx.clone();
            let task = Arc::clone(&task);
            tokio::spawn(async move {
                let output = task(item).await;
                // Permit is released only once the result is queued
                let _ = tx.send((position, output)).await;
                drop(permit);
            });
        }
    });

    rx
}
