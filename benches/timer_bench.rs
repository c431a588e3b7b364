use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use criterion::{criterion_group, criterion_main, Criterion};
use elapse::{Timer, TokioScheduler};
use time::ext::NumericalDuration;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .expect("failed to build runtime")
}

fn start_stop(c: &mut Criterion) {
    let rt = runtime();
    let mut timer = Timer::with_scheduler(Arc::new(TokioScheduler::with_handle(rt.handle().clone())));
    timer.set_delay(1.seconds());
    timer.set_interval(1.seconds());

    c.bench_function("start_stop", |b| {
        b.iter(|| {
            timer.start().unwrap();
            timer.stop();
        })
    });
}

fn immediate_firing(c: &mut Criterion) {
    let rt = runtime();
    let mut timer = Timer::with_scheduler(Arc::new(TokioScheduler::with_handle(rt.handle().clone())));
    let fired = Arc::new(Notify::new());
    let count = Arc::new(AtomicUsize::new(0));
    {
        let fired = Arc::clone(&fired);
        let count = Arc::clone(&count);
        timer.elapsed().subscribe(move || {
            count.fetch_add(1, Ordering::Relaxed);
            fired.notify_one();
        });
    }

    c.bench_function("immediate_firing", |b| {
        b.to_async(&rt).iter(|| {
            timer.start().unwrap();
            let fired = Arc::clone(&fired);
            async move { fired.notified().await }
        })
    });

    timer.stop();
    assert!(count.load(Ordering::Relaxed) > 0);
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(StdDuration::from_secs(3));
    targets = start_stop, immediate_firing
}
criterion_main!(benches);
