//! Pending upload results for staged files
//!
//! Every staged file owns one [`StatContext`]. Whoever drives the upload
//! fulfils it exactly once; [`StatFuture`]s handed out by `stat()` resolve
//! when that happens and stay pending forever otherwise.

use crate::error::Result;
use crate::upload::types::UploadResult;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Single-assignment slot shared between a staged file and its stat futures
#[derive(Default)]
pub struct StatContext {
    result: Mutex<Option<Result<UploadResult>>>,
    wakers: Mutex<Vec<Waker>>,
}

impl StatContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the upload outcome and wake every waiting future
    ///
    /// Returns `false` without touching the stored value if the context was
    /// already completed.
    pub fn complete(&self, result: Result<UploadResult>) -> bool {
        {
            let mut slot = lock(&self.result);
            if slot.is_some() {
                return false;
            }
            *slot = Some(result);
        }

        for waker in lock(&self.wakers).drain(..) {
            waker.wake();
        }
        true
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.result).is_some()
    }

    /// Get the result if available
    pub fn get_result(&self) -> Option<Result<UploadResult>> {
        lock(&self.result).clone()
    }

    fn register(&self, waker: &Waker) {
        let mut wakers = lock(&self.wakers);
        if !wakers.iter().any(|w| w.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }
}

impl std::fmt::Debug for StatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatContext")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// A future resolving to the upload result of one staged file
#[derive(Debug, Clone)]
pub struct StatFuture {
    pub(crate) context: Arc<StatContext>,
}

impl StatFuture {
    pub(crate) fn new(context: Arc<StatContext>) -> Self {
        Self { context }
    }
}

impl Future for StatFuture {
    type Output = Result<UploadResult>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Register before checking so a completion in between still wakes us.
        self.context.register(cx.waker());

        match self.context.get_result() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::types::Cid;
    use std::time::Duration;

    fn result(path: &str) -> UploadResult {
        UploadResult::new(path, 3, Cid::new("Qm1"))
    }

    #[test]
    fn test_stat_context_creation() {
        let context = StatContext::new();
        assert!(!context.is_completed());
        assert!(context.get_result().is_none());
    }

    #[test]
    fn test_stat_context_completes_once() {
        let context = StatContext::new();
        assert!(context.complete(Ok(result("a.txt"))));
        assert!(!context.complete(Err(StorageError::upload_error("late"))));

        let stored = context.get_result().unwrap().unwrap();
        assert_eq!(stored.path, "a.txt");
    }

    #[tokio::test]
    async fn test_stat_future_resolves_after_completion() {
        let context = Arc::new(StatContext::new());
        let future = StatFuture::new(context.clone());

        let completer = tokio::spawn({
            let context = context.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                context.complete(Ok(result("b.txt")));
            }
        });

        let stat = future.await.unwrap();
        assert_eq!(stat.path, "b.txt");
        completer.await.unwrap();
    }

    #[tokio::test]
    async fn test_stat_future_error() {
        let context = Arc::new(StatContext::new());
        context.complete(Err(StorageError::upload_error("Internal Server Error")));

        let first = StatFuture::new(context.clone()).await;
        let second = StatFuture::new(context).await;
        assert!(matches!(first, Err(StorageError::UploadError { .. })));
        assert!(matches!(second, Err(StorageError::UploadError { .. })));
    }

    #[test]
    fn test_completion_wakes_every_waiter() {
        let context = Arc::new(StatContext::new());
        let mut first = tokio_test::task::spawn(StatFuture::new(context.clone()));
        let mut second = tokio_test::task::spawn(StatFuture::new(context.clone()));

        tokio_test::assert_pending!(first.poll());
        tokio_test::assert_pending!(second.poll());

        context.complete(Ok(result("c.txt")));
        assert!(first.is_woken());
        assert!(second.is_woken());

        let stat = tokio_test::assert_ready_ok!(first.poll());
        assert_eq!(stat.path, "c.txt");
        tokio_test::assert_ready_ok!(second.poll());
    }

    #[tokio::test]
    async fn test_stat_future_stays_pending() {
        let future = StatFuture::new(Arc::new(StatContext::new()));
        let outcome = tokio::time::timeout(Duration::from_millis(20), future).await;
        assert!(outcome.is_err());
    }
}
