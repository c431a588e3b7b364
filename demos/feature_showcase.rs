use async_trait::async_trait;
use elapse::{DefaultTimerFactory, Timer, TimerCallback, TimerError, TimerFactory};
use time::ext::NumericalDuration;
use time::OffsetDateTime;
use tokio::time::sleep;

struct ErrorCallback;

#[async_trait]
impl TimerCallback for ErrorCallback {
    async fn execute(&self) -> Result<(), TimerError> {
        Err(TimerError::CallbackError("Simulated error!".into()))
    }
}

#[tokio::main]
async fn main() -> Result<(), TimerError> {
    let factory = DefaultTimerFactory::new();

    // 1. One-shot timer
    let mut one_shot = factory.create();
    one_shot.set_delay(500.milliseconds());
    one_shot.elapsed().subscribe(|| println!("One-shot timer elapsed!"));
    one_shot.start()?;
    sleep(std::time::Duration::from_millis(600)).await;
    println!("One-shot enabled after firing: {}", one_shot.is_enabled());

    // 2. Repeating timer with several subscribers
    let mut repeating = factory.create();
    repeating.set_interval(300.milliseconds());
    repeating.elapsed().subscribe(|| println!("  first subscriber"));
    let second = repeating
        .elapsed()
        .subscribe(|| println!("  second subscriber"));
    repeating.start()?;
    sleep(std::time::Duration::from_millis(700)).await;

    println!("Unsubscribing the second subscriber...");
    repeating.elapsed().unsubscribe(second);
    sleep(std::time::Duration::from_millis(600)).await;

    // 3. Interval changes apply on restart
    println!("Changing interval to 100ms and restarting...");
    repeating.set_interval(100.milliseconds());
    repeating.start()?;
    sleep(std::time::Duration::from_millis(350)).await;
    repeating.stop();
    println!("Repeating enabled after stop: {}", repeating.is_enabled());

    // 4. Start at an absolute time
    let mut scheduled = Timer::new();
    scheduled
        .elapsed()
        .subscribe(|| println!("Scheduled timer elapsed at {}", OffsetDateTime::now_utc()));
    scheduled.start_at(OffsetDateTime::now_utc() + 1.seconds())?;
    sleep(std::time::Duration::from_millis(1100)).await;

    // 5. Error handling
    let mut failing = factory.create();
    failing.elapsed().subscribe(ErrorCallback);
    failing.elapsed().subscribe(|| println!("Still raised after a failing callback."));
    failing.start()?;
    sleep(std::time::Duration::from_millis(50)).await;

    failing.dispose();
    if let Err(e) = failing.start() {
        println!("Error while starting timer: {}", e);
    }

    println!("All timers completed!");
    Ok(())
}
