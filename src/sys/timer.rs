use std::time::Duration;

use tokio::task::JoinHandle;

/// A one-shot callback on the tokio runtime.
///
/// Dropping the timer cancels it; a cancelled timer never runs its callback.
#[derive(Debug)]
pub struct Timer {
    handle: JoinHandle<()>,
}

impl Timer {
    pub fn after<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { handle }
    }

    /// Aborts the pending callback. A callback that already ran is unaffected.
    pub fn cancel(self) { self.handle.abort(); }

    pub fn is_finished(&self) -> bool { self.handle.is_finished() }
}

impl Drop for Timer {
    fn drop(&mut self) { self.handle.abort(); }
}
