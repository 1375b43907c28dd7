//! In-memory batching of redirect events.
//!
//! Events accumulate in a single buffer guarded by a `std::sync::Mutex`. The
//! lock is only ever held for a push or a swap, never across I/O. When the
//! buffer reaches capacity it is sealed (swapped for an empty one) and handed
//! to a detached flush task, so [`RedirectBatcher::record`] never waits on the
//! store.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{Semaphore, watch};
use tracing::{debug, info};

use crate::domain::entities::RedirectEvent;
use crate::domain::repositories::RedirectRepository;
use crate::error::{BestEffortFailure, best_effort};

pub const DEFAULT_BATCH_SIZE: usize = 250;
pub const DEFAULT_FLUSH_CONCURRENCY: usize = 8;

struct Buffer {
    events: Vec<RedirectEvent>,
    closed: bool,
}

/// Accumulates redirect events and persists them in batches.
///
/// # Delivery
///
/// At most once. A batch whose write fails is logged, counted and dropped.
/// Order is preserved within a batch but not across batches, since flush tasks
/// run concurrently (bounded by the flush concurrency).
pub struct RedirectBatcher<R: RedirectRepository + 'static> {
    repository: Arc<R>,
    capacity: usize,
    buffer: Mutex<Buffer>,
    flush_permits: Arc<Semaphore>,
    in_flight: Arc<watch::Sender<usize>>,
    runtime: Handle,
}

/// Marks one spawned flush as outstanding until dropped.
struct FlushGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl FlushGuard {
    fn new(in_flight: Arc<watch::Sender<usize>>) -> Self {
        in_flight.send_modify(|n| *n += 1);
        metrics::gauge!("shortener_redirect_flushes_in_flight").increment(1.0);
        Self { in_flight }
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
        metrics::gauge!("shortener_redirect_flushes_in_flight").decrement(1.0);
    }
}

impl<R: RedirectRepository + 'static> RedirectBatcher<R> {
    /// Creates a batcher bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(repository: Arc<R>, capacity: usize, flush_concurrency: usize) -> Self {
        Self::with_handle(repository, capacity, flush_concurrency, Handle::current())
    }

    /// Creates a batcher whose flush tasks are spawned on `runtime`.
    pub fn with_handle(
        repository: Arc<R>,
        capacity: usize,
        flush_concurrency: usize,
        runtime: Handle,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            repository,
            capacity,
            buffer: Mutex::new(Buffer {
                events: Vec::with_capacity(capacity),
                closed: false,
            }),
            flush_permits: Arc::new(Semaphore::new(flush_concurrency.max(1))),
            in_flight: Arc::new(watch::Sender::new(0)),
            runtime,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events buffered but not yet handed to a flush.
    pub fn pending(&self) -> usize {
        self.lock().events.len()
    }

    /// Number of spawned flushes that have not finished yet.
    pub fn flushes_in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Buffers one event, sealing and flushing the batch once it is full.
    ///
    /// Returns `false` if the batcher has already been shut down, in which case
    /// the event is dropped.
    pub fn record(&self, event: RedirectEvent) -> bool {
        let sealed = {
            let mut buffer = self.lock();
            if buffer.closed {
                drop(buffer);
                metrics::counter!("shortener_redirect_events_rejected_total").increment(1);
                best_effort(BestEffortFailure::EventRejected, &"redirect batcher is shut down");
                return false;
            }

            buffer.events.push(event);
            if buffer.events.len() >= self.capacity {
                Some(mem::replace(
                    &mut buffer.events,
                    Vec::with_capacity(self.capacity),
                ))
            } else {
                None
            }
        };

        metrics::counter!("shortener_redirect_events_recorded_total").increment(1);
        if let Some(batch) = sealed {
            self.spawn_flush(batch);
        }
        true
    }

    /// Stops accepting events and persists whatever is still buffered.
    ///
    /// Returns the number of events drained. Flushes started by earlier fills
    /// are not awaited here; see [`RedirectBatcher::wait_flushes`].
    pub async fn shutdown(&self) -> usize {
        let remainder = {
            let mut buffer = self.lock();
            if buffer.closed {
                return 0;
            }
            buffer.closed = true;
            mem::take(&mut buffer.events)
        };

        let drained = remainder.len();
        if drained == 0 {
            debug!("No buffered redirect events to drain");
            return 0;
        }

        info!(events = drained, "Draining buffered redirect events");
        flush_batch(self.repository.as_ref(), remainder).await;
        drained
    }

    /// Waits until every flush spawned so far has finished.
    ///
    /// Call after [`RedirectBatcher::shutdown`] and before closing the store,
    /// otherwise sealed batches still waiting for a flush permit find the
    /// store closed and are dropped.
    pub async fn wait_flushes(&self) {
        let mut in_flight = self.in_flight.subscribe();
        let outstanding = *in_flight.borrow();
        if outstanding > 0 {
            info!(flushes = outstanding, "Waiting for in-flight redirect flushes");
        }
        // The sender lives as long as `self`, so this only ends at zero.
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }

    fn spawn_flush(&self, batch: Vec<RedirectEvent>) {
        let repository = Arc::clone(&self.repository);
        let permits = Arc::clone(&self.flush_permits);
        let guard = FlushGuard::new(Arc::clone(&self.in_flight));

        self.runtime.spawn(async move {
            let _guard = guard;
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            flush_batch(repository.as_ref(), batch).await;
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writes one batch, swallowing failures. Returns the number of events persisted.
async fn flush_batch<R: RedirectRepository + ?Sized>(
    repository: &R,
    batch: Vec<RedirectEvent>,
) -> usize {
    let size = batch.len();

    match repository.insert_batch(batch).await {
        Ok(rows) => {
            metrics::counter!("shortener_redirect_batches_flushed_total").increment(1);
            metrics::counter!("shortener_redirect_events_persisted_total").increment(rows);
            debug!(events = size, rows, "Redirect batch flushed");
            size
        }
        Err(e) => {
            metrics::counter!("shortener_redirect_batches_dropped_total").increment(1);
            best_effort(BestEffortFailure::BatchDropped, &e);
            debug!(events = size, "Redirect batch dropped");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockRedirectRepository;
    use crate::error::StoreError;
    use tokio::sync::mpsc;

    fn event(i: usize) -> RedirectEvent {
        RedirectEvent::now(format!("alias{i}"), Some("test-agent"))
    }

    fn recording_repo() -> (MockRedirectRepository, mpsc::UnboundedReceiver<Vec<RedirectEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo.expect_insert_batch().returning(move |batch| {
            let rows = batch.len() as u64;
            let _ = tx.send(batch);
            Ok(rows)
        });
        (mock_repo, rx)
    }

    #[tokio::test]
    async fn test_buffer_below_capacity_does_not_flush() {
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo.expect_insert_batch().times(0);

        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 3, 1);

        assert!(batcher.record(event(0)));
        assert!(batcher.record(event(1)));
        tokio::task::yield_now().await;

        assert_eq!(batcher.pending(), 2);
    }

    #[tokio::test]
    async fn test_full_buffer_flushes_in_order() {
        let (mock_repo, mut rx) = recording_repo();
        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 3, 1);

        let events: Vec<_> = (0..3).map(event).collect();
        for e in events.clone() {
            batcher.record(e);
        }

        assert_eq!(batcher.pending(), 0);
        let flushed = rx.recv().await.unwrap();
        assert_eq!(flushed, events);
    }

    #[tokio::test]
    async fn test_capacity_plus_one_leaves_one_pending() {
        let (mock_repo, mut rx) = recording_repo();
        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 4, 2);

        for i in 0..5 {
            batcher.record(event(i));
        }

        assert_eq!(rx.recv().await.unwrap().len(), 4);
        assert_eq!(batcher.pending(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_remainder() {
        let (mock_repo, mut rx) = recording_repo();
        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 10, 1);

        for i in 0..3 {
            batcher.record(event(i));
        }

        assert_eq!(batcher.shutdown().await, 3);
        // The drain is awaited, so the batch is already delivered.
        assert_eq!(rx.try_recv().unwrap().len(), 3);
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_with_empty_buffer_skips_store() {
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo.expect_insert_batch().times(0);

        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 10, 1);

        assert_eq!(batcher.shutdown().await, 0);
    }

    #[tokio::test]
    async fn test_record_after_shutdown_is_rejected() {
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo.expect_insert_batch().times(0);

        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 1, 1);
        batcher.shutdown().await;

        assert!(!batcher.record(event(0)));
        assert_eq!(batcher.pending(), 0);
        assert_eq!(batcher.shutdown().await, 0);
    }

    #[tokio::test]
    async fn test_failed_flush_is_dropped() {
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo
            .expect_insert_batch()
            .times(1)
            .returning(|_| Err(StoreError::Closed));

        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 10, 1);
        batcher.record(event(0));

        // Still reports what it attempted to drain.
        assert_eq!(batcher.shutdown().await, 1);
    }

    #[tokio::test]
    async fn test_wait_flushes_covers_batches_queued_for_a_permit() {
        let (mock_repo, mut rx) = recording_repo();
        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 2, 1);

        for i in 0..6 {
            batcher.record(event(i));
        }
        assert_eq!(batcher.flushes_in_flight(), 3);

        batcher.wait_flushes().await;

        assert_eq!(batcher.flushes_in_flight(), 0);
        for _ in 0..3 {
            assert_eq!(rx.try_recv().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_wait_flushes_with_nothing_spawned_returns() {
        let mut mock_repo = MockRedirectRepository::new();
        mock_repo.expect_insert_batch().times(0);

        let batcher = RedirectBatcher::new(Arc::new(mock_repo), 10, 1);
        batcher.record(event(0));

        batcher.wait_flushes().await;
        assert_eq!(batcher.pending(), 1);
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let batcher = RedirectBatcher::with_handle(
            Arc::new(MockRedirectRepository::new()),
            0,
            0,
            runtime.handle().clone(),
        );

        assert_eq!(batcher.capacity(), 1);
    }
}
