//! # elapse
//! A small Tokio timer that fires once after a delay and optionally keeps
//! firing at a fixed interval until stopped.

pub mod duration;
pub mod elapsed;
pub mod errors;
pub mod factory;
#[cfg(any(test, feature = "test-util"))]
pub mod manual;
pub mod scheduler;
mod sync;
pub mod timer;

pub use duration::DurationExt;
pub use elapsed::{Elapsed, SubscriptionId, TimerCallback};
pub use errors::TimerError;
pub use factory::{DefaultTimerFactory, TimerFactory};
#[cfg(any(test, feature = "test-util"))]
pub use manual::{ManualScheduler, PendingSchedule};
pub use scheduler::{ScheduleHandle, Scheduler, Tick, TokioScheduler};
pub use timer::{Timer, TimerState};
