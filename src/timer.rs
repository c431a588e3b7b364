use std::sync::{Arc, Mutex};

use async_trait::async_trait;
#[cfg(feature = "logging")]
use log::debug;
use time::{Duration, OffsetDateTime};

use crate::duration::DurationExt;
use crate::elapsed::Elapsed;
use crate::errors::TimerError;
use crate::scheduler::{ScheduleHandle, Scheduler, Tick, TokioScheduler};
use crate::sync::lock;

/// Represents the state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Stopped,
    Disposed,
}

/// State shared between a timer and its in-flight firings.
///
/// `generation` changes on every arm so a firing can tell whether its
/// schedule is still the current one.
#[derive(Debug)]
struct Arm {
    state: TimerState,
    generation: u64,
}

/// Raises [`Elapsed`] once after [`delay`](Self::delay) and then every
/// [`interval`](Self::interval), until stopped.
///
/// `delay` and `interval` are read when the timer is started; changing them
/// on a running timer takes effect on the next [`start`](Self::start).
pub struct Timer {
    delay: Duration,
    interval: Duration,
    elapsed: Elapsed,
    arm: Arc<Mutex<Arm>>,
    scheduler: Arc<dyn Scheduler>,
    schedule: Option<Box<dyn ScheduleHandle>>,
}

impl Timer {
    /// Creates a stopped timer driven by the current Tokio runtime.
    pub fn new() -> Self {
        Self::with_scheduler(Arc::new(TokioScheduler::new()))
    }

    /// Creates a stopped timer armed through `scheduler`.
    pub fn with_scheduler(scheduler: Arc<dyn Scheduler>) -> Self {
        Timer {
            delay: Duration::ZERO,
            interval: Duration::ZERO,
            elapsed: Elapsed::new(),
            arm: Arc::new(Mutex::new(Arm {
                state: TimerState::Stopped,
                generation: 0,
            })),
            scheduler,
            schedule: None,
        }
    }

    /// Time from [`start`](Self::start) until the first notification.
    /// Non-positive values fire immediately.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sets the delay used by the next [`start`](Self::start).
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Time between notifications after the first. Non-positive values
    /// make the timer fire once and stop.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sets the interval used by the next [`start`](Self::start).
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// The notification hook raised on every firing.
    pub fn elapsed(&self) -> &Elapsed {
        &self.elapsed
    }

    /// Gets the current state of the timer.
    pub fn state(&self) -> TimerState {
        lock(&self.arm).state
    }

    /// Whether the timer is armed and will fire again.
    pub fn is_enabled(&self) -> bool {
        self.state() == TimerState::Running
    }

    /// Arms the timer with the current delay and interval.
    ///
    /// A running timer is re-armed from now.
    pub fn start(&mut self) -> Result<(), TimerError> {
        let delay = self.delay.zero_if_negative();
        let period = self.interval.zero_if_negative();
        let repeating = !period.is_zero();

        let generation = {
            let mut arm = lock(&self.arm);
            if arm.state == TimerState::Disposed {
                return Err(TimerError::Disposed);
            }
            arm.generation += 1;
            arm.state = TimerState::Running;
            arm.generation
        };

        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }

        #[cfg(feature = "logging")]
        debug!(
            "Starting timer with delay {:?} and interval {:?}.",
            delay, period
        );

        let firing = Arc::new(Firing {
            elapsed: self.elapsed.clone(),
            arm: Arc::clone(&self.arm),
            generation,
            repeating,
        });
        let armed = if repeating {
            self.scheduler.schedule_repeating(delay, period, firing)
        } else {
            self.scheduler.schedule_once(delay, firing)
        };

        match armed {
            Ok(schedule) => {
                self.schedule = Some(schedule);
                Ok(())
            }
            Err(err) => {
                let mut arm = lock(&self.arm);
                if arm.generation == generation {
                    arm.state = TimerState::Stopped;
                }
                Err(err)
            }
        }
    }

    /// Sets the delay so the first notification happens at `at`, then starts.
    ///
    /// A time in the past fires immediately. The interval is left unchanged.
    pub fn start_at(&mut self, at: OffsetDateTime) -> Result<(), TimerError> {
        self.delay = at - OffsetDateTime::now_utc();
        self.start()
    }

    /// Stops the timer. Does nothing if it is not running.
    pub fn stop(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }

        let mut arm = lock(&self.arm);
        if arm.state == TimerState::Running {
            arm.state = TimerState::Stopped;
            #[cfg(feature = "logging")]
            debug!("Timer stopped.");
        }
    }

    /// Cancels any pending firing and releases the schedule for good.
    ///
    /// No firing starts after this returns. A firing whose callbacks are
    /// already running (on another worker thread, or the caller's own
    /// callback) is not interrupted and finishes its round.
    ///
    /// Later calls to [`start`](Self::start) fail with [`TimerError::Disposed`].
    pub fn dispose(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }

        let mut arm = lock(&self.arm);
        if arm.state != TimerState::Disposed {
            arm.state = TimerState::Disposed;
            #[cfg(feature = "logging")]
            debug!("Timer disposed.");
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("delay", &self.delay)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// One armed schedule's view of its timer.
struct Firing {
    elapsed: Elapsed,
    arm: Arc<Mutex<Arm>>,
    generation: u64,
    repeating: bool,
}

impl Firing {
    fn is_current(&self) -> bool {
        let arm = lock(&self.arm);
        arm.generation == self.generation && arm.state == TimerState::Running
    }
}

#[async_trait]
impl Tick for Firing {
    async fn tick(&self) {
        if !self.is_current() {
            return;
        }

        self.elapsed.raise().await;

        // The interval captured at arm time decides, not the current property.
        if !self.repeating {
            let mut arm = lock(&self.arm);
            if arm.generation == self.generation && arm.state == TimerState::Running {
                arm.state = TimerState::Stopped;
                #[cfg(feature = "logging")]
                debug!("One-shot timer completed.");
            }
        }
    }
}
