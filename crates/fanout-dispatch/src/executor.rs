//! Where dispatch tasks run.

use std::future::Future;
use tokio::task::JoinHandle;

/// Trait for executors that can spawn dispatch tasks.
///
/// The dispatcher spawns one task per call and keeps the returned handle, so
/// it can await, detach or abort each task individually.
///
/// # Example
///
/// ```rust,no_run
/// use fanout_dispatch::Executor;
/// use tokio::runtime::Handle;
///
/// // A runtime handle pins tasks to that runtime.
/// fn assert_executor<E: Executor>(_: E) {}
/// assert_executor(Handle::current());
/// ```
pub trait Executor: Clone + Send + Sync + 'static {
    /// Spawns a future onto this executor.
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;
}

/// Spawns onto a specific tokio runtime.
impl Executor for tokio::runtime::Handle {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::runtime::Handle::spawn(self, future)
    }
}

/// Spawns onto whichever tokio runtime is driving the dispatch.
///
/// Unlike a captured [`Handle`](tokio::runtime::Handle), this can be created
/// outside of a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentRuntime;

impl Executor for CurrentRuntime {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(future)
    }
}
