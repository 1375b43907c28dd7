//! Concurrency ceiling shared by every PostgreSQL operation.

use crate::error::StoreError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

/// Counting semaphore capping outstanding store operations.
///
/// One gate is shared by link creates, link reads, redirect batch inserts and
/// analytics queries. A permit is an RAII guard, so it is released on every
/// exit path, including early returns via `?` and cancelled futures.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl ConnectionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity
            .min(Semaphore::MAX_PERMITS)
            .min(u32::MAX as usize)
            .max(1) as u32;
        Self {
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        }
    }

    /// Waits for a slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] once the gate has been closed.
    pub async fn enter(&self) -> Result<OwnedSemaphorePermit, StoreError> {
        self.enter_many(1).await
    }

    /// Waits for `n` slots at once, for operations that use several connections.
    pub async fn enter_many(&self, n: u32) -> Result<OwnedSemaphorePermit, StoreError> {
        Arc::clone(&self.permits)
            .acquire_many_owned(n.min(self.capacity))
            .await
            .map_err(|_| StoreError::Closed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity() - self.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Waits for every outstanding operation to finish, then rejects new ones.
    pub async fn close(&self) {
        if self.permits.is_closed() {
            return;
        }

        let in_use = self.in_use();
        if in_use > 0 {
            info!(in_use, "Waiting for in-flight store operations");
        }

        // Holding every permit means nothing else is running.
        let drained = self.permits.acquire_many(self.capacity).await;
        self.permits.close();
        drop(drained);
    }
}
