//! A virtual-clock [`Scheduler`] for deterministic tests.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::errors::TimerError;
use crate::scheduler::{ScheduleHandle, Scheduler, Tick};
use crate::sync::lock;

/// A schedule waiting on a [`ManualScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSchedule {
    /// Virtual time of the next firing.
    pub due: Duration,
    /// Repeat period, `None` for one-shot schedules.
    pub period: Option<Duration>,
}

struct Entry {
    id: u64,
    due: Duration,
    period: Option<Duration>,
    tick: Arc<dyn Tick>,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

/// Scheduler whose clock only moves when [`advance`](Self::advance) is called.
///
/// Clones share one clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<Clock>>,
}

impl ManualScheduler {
    /// Creates a scheduler with its clock at zero and nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        lock(&self.clock).now
    }

    /// Armed schedules, earliest first.
    pub fn pending(&self) -> Vec<PendingSchedule> {
        let clock = lock(&self.clock);
        let mut pending: Vec<_> = clock
            .entries
            .iter()
            .map(|entry| (entry.due, entry.id, entry.period))
            .collect();
        pending.sort();
        pending
            .into_iter()
            .map(|(due, _, period)| PendingSchedule { due, period })
            .collect()
    }

    /// Moves the clock forward by `by`, running every tick that falls due.
    ///
    /// Returns the number of ticks run.
    pub async fn advance(&self, by: Duration) -> usize {
        let target = lock(&self.clock).now.saturating_add(by);
        let mut fired = 0;

        while let Some(tick) = self.next_due(target) {
            tick.tick().await;
            fired += 1;
        }

        lock(&self.clock).now = target;
        fired
    }

    fn next_due(&self, target: Duration) -> Option<Arc<dyn Tick>> {
        let mut clock = lock(&self.clock);
        let index = clock
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= target)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(index, _)| index)?;

        let due = clock.entries[index].due;
        clock.now = due;
        let tick = Arc::clone(&clock.entries[index].tick);
        match clock.entries[index].period {
            Some(period) => clock.entries[index].due = due.saturating_add(period),
            None => {
                clock.entries.remove(index);
            }
        }
        Some(tick)
    }

    fn arm(&self, delay: Duration, period: Option<Duration>, tick: Arc<dyn Tick>) -> Box<dyn ScheduleHandle> {
        let mut clock = lock(&self.clock);
        let id = clock.next_id;
        clock.next_id += 1;
        let due = clock.now.saturating_add(delay);
        clock.entries.push(Entry {
            id,
            due,
            period,
            tick,
        });
        Box::new(ManualHandle {
            id,
            clock: Arc::downgrade(&self.clock),
        })
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(
        &self,
        delay: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError> {
        Ok(self.arm(delay, None, tick))
    }

    fn schedule_repeating(
        &self,
        delay: Duration,
        period: Duration,
        tick: Arc<dyn Tick>,
    ) -> Result<Box<dyn ScheduleHandle>, TimerError> {
        Ok(self.arm(delay, Some(period), tick))
    }
}

struct ManualHandle {
    id: u64,
    clock: Weak<Mutex<Clock>>,
}

impl ScheduleHandle for ManualHandle {
    fn cancel(&self) {
        if let Some(clock) = self.clock.upgrade() {
            lock(&clock).entries.retain(|entry| entry.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Recorder {
        clock: Mutex<Option<ManualScheduler>>,
        seen: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Tick for Recorder {
        async fn tick(&self) {
            let now = self.clock.lock().unwrap().as_ref().map(ManualScheduler::now);
            self.seen.lock().unwrap().push(now.unwrap_or_default());
        }
    }

    fn recorder(scheduler: &ManualScheduler) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::default());
        *recorder.clock.lock().unwrap() = Some(scheduler.clone());
        recorder
    }

    #[tokio::test]
    async fn runs_ticks_at_their_virtual_time() {
        let scheduler = ManualScheduler::new();
        let recorder = recorder(&scheduler);
        let _handle = scheduler
            .schedule_repeating(Duration::from_millis(10), Duration::from_millis(50), recorder.clone())
            .unwrap();

        assert_eq!(scheduler.advance(Duration::from_millis(125)).await, 3);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(60),
                Duration::from_millis(110)
            ]
        );
        assert_eq!(scheduler.now(), Duration::from_millis(125));
        assert_eq!(
            scheduler.pending(),
            vec![PendingSchedule {
                due: Duration::from_millis(160),
                period: Some(Duration::from_millis(50)),
            }]
        );
    }

    #[tokio::test]
    async fn one_shot_entries_are_removed_after_firing() {
        let scheduler = ManualScheduler::new();
        let recorder = recorder(&scheduler);
        let _handle = scheduler
            .schedule_once(Duration::ZERO, recorder.clone())
            .unwrap();

        assert_eq!(scheduler.advance(Duration::ZERO).await, 1);
        assert!(scheduler.pending().is_empty());
        assert_eq!(scheduler.advance(Duration::from_secs(1)).await, 0);
    }

    #[tokio::test]
    async fn cancelled_handles_never_fire() {
        let scheduler = ManualScheduler::new();
        let recorder = recorder(&scheduler);
        let handle = scheduler
            .schedule_once(Duration::from_millis(5), recorder.clone())
            .unwrap();

        handle.cancel();
        assert_eq!(scheduler.advance(Duration::from_secs(1)).await, 0);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
