use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A cancellable delayed callback. Dropping the timer cancels it.
///
/// Cancellation only stops a timer that has not fired yet. Once the delay
/// elapses the callback runs to completion, so it receives the token and must
/// check [`CancellationToken::is_cancelled`] after taking whatever lock
/// guards the state it is about to touch.
#[derive(Debug)]
pub struct PlacementTimer {
    token: CancellationToken,
    duration: Duration,
}

impl PlacementTimer {
    /// Spawn a task that invokes `on_expire` after `delay` unless cancelled first.
    pub fn schedule<F, Fut>(delay: Duration, on_expire: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {},
                () = tokio::time::sleep(delay) => on_expire(task_token).await,
            }
        });
        Self {
            token,
            duration: delay,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Drop for PlacementTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
