//! Owned handles for timer and frame-loop tasks

use std::future::Future;

use tokio::task::AbortHandle;

/// A spawned effect task that is cancelled when the handle is cancelled,
/// replaced, or dropped.
#[derive(Debug)]
pub struct TaskHandle {
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    /// Spawn on the current tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            abort: Some(tokio::spawn(future).abort_handle()),
        }
    }

    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().is_none_or(AbortHandle::is_finished)
    }

    /// Release the handle without cancelling the task.
    pub fn detach(mut self) {
        self.abort = None;
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = TaskHandle::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_completion() {
        let handle = TaskHandle::spawn(async {});
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(handle.is_finished());
    }
}
