use std::sync::Arc;

use crate::scheduler::Scheduler;
use crate::timer::Timer;

/// Creates timers.
///
/// Depend on this instead of [`Timer::new`] to substitute timers in tests.
pub trait TimerFactory {
    /// Creates a stopped timer with zero delay and interval.
    fn create(&self) -> Timer;
}

/// Factory for timers driven by Tokio, or by a shared custom [`Scheduler`].
#[derive(Clone, Default)]
pub struct DefaultTimerFactory {
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl DefaultTimerFactory {
    /// Creates a factory whose timers run on the current Tokio runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every timer created will be armed through `scheduler`.
    pub fn with_scheduler(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler: Some(scheduler),
        }
    }
}

impl TimerFactory for DefaultTimerFactory {
    fn create(&self) -> Timer {
        match &self.scheduler {
            Some(scheduler) => Timer::with_scheduler(Arc::clone(scheduler)),
            None => Timer::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::ManualScheduler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use time::ext::NumericalDuration;
    use time::Duration;

    /// Arms a heartbeat through whatever factory it is handed.
    fn heartbeat(factory: &impl TimerFactory, beats: Arc<AtomicUsize>) -> Timer {
        let mut timer = factory.create();
        timer.set_interval(1.seconds());
        timer.elapsed().subscribe(move || {
            beats.fetch_add(1, Ordering::SeqCst);
        });
        timer.start().unwrap();
        timer
    }

    #[test]
    fn creates_stopped_timers_with_defaults() {
        let timer = DefaultTimerFactory::new().create();
        assert_eq!(timer.delay(), Duration::ZERO);
        assert_eq!(timer.interval(), Duration::ZERO);
        assert!(!timer.is_enabled());
        assert!(timer.elapsed().is_empty());
    }

    #[tokio::test]
    async fn substitutes_the_scheduler_of_created_timers() {
        let scheduler = ManualScheduler::new();
        let factory = DefaultTimerFactory::with_scheduler(Arc::new(scheduler.clone()));
        let beats = Arc::new(AtomicUsize::new(0));

        let first = heartbeat(&factory, Arc::clone(&beats));
        let second = heartbeat(&factory, Arc::clone(&beats));
        assert!(first.is_enabled() && second.is_enabled());

        scheduler.advance(StdDuration::from_secs(2)).await;
        assert_eq!(beats.load(Ordering::SeqCst), 6);
    }
}
