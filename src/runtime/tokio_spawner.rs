//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::Spawn;

/// Tokio-based spawner that runs delayed tasks on a tokio runtime.
///
/// Delayed tasks are a `sleep` followed by the task; dropping the runtime
/// drops pending timers with it.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Spawn for TokioSpawner {
    fn spawn_after<F>(&self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        });
    }
}
