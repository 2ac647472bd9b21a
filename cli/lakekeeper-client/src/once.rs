//! Memoized one-time initialization.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

/// Runs an async initializer at most once and hands every caller its outcome.
///
/// Unlike [`OnceCell::get_or_try_init`], a failure is memoized as well: later
/// callers observe the same error instead of retrying the initializer.
/// If the initializing future is dropped before completing, the next caller
/// runs the initializer.
#[derive(Debug)]
pub(crate) struct OnceResult<E> {
    cell: OnceCell<Result<(), Arc<E>>>,
}

impl<E> OnceResult<E> {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub(crate) async fn ensure<F, Fut>(&self, init: F) -> Result<(), Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.cell
            .get_or_init(|| async move { init().await.map_err(Arc::new) })
            .await
            .clone()
    }
}
