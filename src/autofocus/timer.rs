use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A closure that runs once after a delay unless cancelled first.
///
/// Dropping the task cancels it.
pub struct DeferredTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Must be called from within a tokio runtime
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        });

        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the closure ran or the cancellation was observed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
