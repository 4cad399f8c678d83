//! Admission gate bounding simultaneous outbound provider calls
//!
//! One gate is shared by every adapter. A call holds a permit for its whole
//! duration; the permit is dropped on every exit path, including errors and
//! cancellation of the surrounding future.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::providers::ProviderError;

/// Recommended capacity for outbound API calls
pub const DEFAULT_CAPACITY: usize = 12;

/// Counting admission gate for provider calls
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    name: String,
}

impl ConcurrencyGate {
    /// Create a new gate; a zero capacity is raised to one
    pub fn new(name: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            name: name.to_string(),
        }
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ProviderError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ProviderError::GateClosed)?;
        debug!(gate = %self.name, available = self.available(), "Acquired gate permit");
        Ok(permit)
    }

    /// Acquire a permit and run the operation while holding it
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let _permit = self.acquire().await?;
        operation().await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get available permits
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new("provider-api", DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}
