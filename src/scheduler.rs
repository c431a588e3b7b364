//! The wake-up mechanism a [`Timer`](crate::Timer) arms on `start`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::errors::TimerError;

/// One firing, as handed to a [`Scheduler`].
#[async_trait]
pub trait Tick: Send + Sync {
    /// Runs the firing to completion.
    async fn tick(&self);
}

/// A pending schedule returned by a [`Scheduler`].
pub trait ScheduleHandle: Send + Sync {
    /// Cancels all future firings. A firing already running is not interrupted.
    fn cancel(&self);
}

/// Arms one-shot or repeating wake-ups.
pub trait Scheduler: Send + Sync {
    /// Fires `tick` once after `delay`.
    fn schedule_once(
        &self,
        delay: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError>;

    /// Fires `tick` after `delay` and then every `period` until cancelled.
    ///
    /// `period` is never zero; zero-interval timers use [`schedule_once`](Self::schedule_once).
    fn schedule_repeating(
        &self,
        delay: Duration,
        period: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError>;
}

/// Scheduler backed by Tokio's timer wheel.
///
/// Each arm spawns one task, so firings of the same schedule never overlap.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    runtime: Option<Handle>,
}

impl TokioScheduler {
    /// Uses whichever runtime is current when a timer is started.
    pub fn new() -> Self {
        Self { runtime: None }
    }

    /// Always spawns onto `runtime`, even when started from outside it.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }

    fn runtime(&self) -> Result<Handle, TimerError> {
        match &self.runtime {
            Some(runtime) => Ok(runtime.clone()),
            None => Handle::try_current().map_err(|_| TimerError::NoRuntime),
        }
    }
}

/// Tokio's own stand-in for "never": thirty years out.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + delay`, clamped to [`FAR_FUTURE`] when the sum would overflow.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay.min(FAR_FUTURE))
        .unwrap_or_else(|| now + FAR_FUTURE)
}

impl Scheduler for TokioScheduler {
    fn schedule_once(
        &self,
        delay: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError> {
        let runtime = self.runtime()?;
        let deadline = {
            let _guard = runtime.enter();
            deadline_after(delay)
        };
        let cancel = Arc::new(Notify::new());
        let cancelled = Arc::clone(&cancel);

        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.notified() => return,
                _ = time::sleep_until(deadline) => {}
            }
            tick.tick().await;
        });

        Ok(Box::new(TaskHandle { cancel }))
    }

    fn schedule_repeating(
        &self,
        delay: Duration,
        period: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError> {
        let runtime = self.runtime()?;
        let first = {
            let _guard = runtime.enter();
            deadline_after(delay)
        };
        let cancel = Arc::new(Notify::new());
        let cancelled = Arc::clone(&cancel);

        runtime.spawn(async move {
            let mut ticker = time::interval_at(first, period.min(FAR_FUTURE));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.notified() => break,
                    _ = ticker.tick() => {}
                }
                // Only the wait is cancellable; a started firing runs to the end.
                tick.tick().await;
            }
        });

        Ok(Box::new(TaskHandle { cancel }))
    }
}

/// Wakes the schedule's task so it leaves its wait and exits.
///
/// `notify_one` stores a permit, so a cancel issued before the task first
/// waits is still observed.
struct TaskHandle {
    cancel: Arc<Notify>,
}

impl ScheduleHandle for TaskHandle {
    fn cancel(&self) {
        self.cancel.notify_one();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
