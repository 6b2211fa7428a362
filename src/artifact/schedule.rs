use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::error;
use tracing::warn;

/// Longest period a recurring task accepts; longer ones are clamped.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 86_400);

/// Handle to a recurring task.
///
/// Cancelling lets a run that already started finish but prevents any
/// further run.
#[derive(Clone)]
pub struct TaskHandle {
  inner: Arc<TaskInner>,
}

struct TaskInner {
  interval: Duration,
  cancel_tx: watch::Sender<bool>,
  join: Mutex<Option<JoinHandle<()>>>,
}

impl TaskHandle {
  /// Spawn `run` every `interval`, first after one full interval. Ticks that
  /// fall due while a run is still going are skipped, not queued.
  pub fn spawn_recurring<F, Fut>(interval: Duration, mut run: F) -> Self
  where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let interval = if interval > MAX_INTERVAL {
      warn!(
        interval_secs = interval.as_secs(),
        max_secs = MAX_INTERVAL.as_secs(),
        "Recurring task interval clamped"
      );
      MAX_INTERVAL
    } else {
      interval
    };
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

      loop {
        tokio::select! {
          biased;
          changed = cancel_rx.changed() => {
            if changed.is_err() || *cancel_rx.borrow() {
              break;
            }
            continue;
          }
          _ = ticker.tick() => {}
        }

        if *cancel_rx.borrow() {
          break;
        }
        run().await;
      }
    });

    Self {
      inner: Arc::new(TaskInner {
        interval,
        cancel_tx,
        join: Mutex::new(Some(join)),
      }),
    }
  }

  pub fn interval(&self) -> Duration {
    self.inner.interval
  }

  pub fn cancel(&self) {
    self.inner.cancel_tx.send_replace(true);
  }

  pub fn is_cancelled(&self) -> bool {
    *self.inner.cancel_tx.borrow()
  }

  /// Wait for the task to stop. Only meaningful after [`TaskHandle::cancel`].
  /// Returns false if the task panicked or was aborted.
  pub async fn join(&self) -> bool {
    let join = match self.inner.join.lock() {
      Ok(mut guard) => guard.take(),
      Err(poisoned) => poisoned.into_inner().take(),
    };
    let Some(join) = join else {
      return true;
    };
    match join.await {
      Ok(()) => true,
      Err(e) => {
        error!(
          interval_secs = self.inner.interval.as_secs(),
          panicked = e.is_panic(),
          error = %e,
          "Recurring task failed"
        );
        false
      }
    }
  }
}

impl fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("TaskHandle")
      .field("interval", &self.inner.interval)
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}
