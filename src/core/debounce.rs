use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delays values until they stop changing for `delay`.
///
/// Every [`push`](Debouncer::push) restarts the timer; only the value that
/// survives a full quiet period reaches the output channel. Dropping the
/// debouncer (or calling [`cancel`](Debouncer::cancel)) aborts a pending timer
/// so nothing fires after teardown.
pub struct Debouncer<T> {
    delay: Duration,
    output: mpsc::UnboundedSender<T>,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (output, settled) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            output,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        };
        (debouncer, settled)
    }

    /// Must be called from inside a tokio runtime.
    pub fn push(&mut self, value: T) {
        self.abort_pending();

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let latest = Arc::clone(&self.generation);
        let output = self.output.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // 期間內又有新值：放棄
            if latest.load(Ordering::Acquire) == generation {
                let _ = output.send(value);
            }
        }));
    }

    /// 取消尚未觸發的計時器
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.abort_pending();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
