use super::*;
use anyhow::bail;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Counting {
    name: String,
    calls: AtomicUsize,
}

impl PollJob for Counting {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn counting(name: &str) -> Arc<Counting> {
    Arc::new(Counting {
        name: name.to_string(),
        calls: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn test_jobs_run_on_their_own_interval() {
    let fast = counting("fast");
    let slow = counting("slow");

    let mut scheduler = PollScheduler::new();
    scheduler
        .add(fast.clone(), Duration::from_millis(10), Duration::ZERO)
        .add(slow.clone(), Duration::from_millis(200), Duration::ZERO);
    assert_eq!(scheduler.len(), 2);

    let handle = scheduler.start();
    sleep(Duration::from_millis(120)).await;
    handle.shutdown().await;

    let fast_calls = fast.calls.load(Ordering::SeqCst);
    let slow_calls = slow.calls.load(Ordering::SeqCst);
    assert!(fast_calls >= 3, "fast ran {} times", fast_calls);
    // First tick fires immediately, the second not before 200ms
    assert_eq!(slow_calls, 1);
}

#[tokio::test]
async fn test_initial_delay() {
    let delayed = counting("delayed");
    let mut scheduler = PollScheduler::new();
    scheduler.add(delayed.clone(), Duration::from_millis(10), Duration::from_secs(30));

    let handle = scheduler.start();
    sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;

    assert_eq!(delayed.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_stops_polling() {
    let job = counting("job");
    let mut scheduler = PollScheduler::new();
    scheduler.add(job.clone(), Duration::from_millis(5), Duration::ZERO);

    let handle = scheduler.start();
    sleep(Duration::from_millis(30)).await;
    handle.shutdown().await;

    let after_shutdown = job.calls.load(Ordering::SeqCst);
    sleep(Duration::from_millis(30)).await;
    assert_eq!(job.calls.load(Ordering::SeqCst), after_shutdown);
}

#[tokio::test]
async fn test_failing_job_keeps_running() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut scheduler = PollScheduler::new();
    scheduler.add_fn("flaky", Duration::from_millis(5), Duration::ZERO, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        bail!("queue file unreadable")
    });

    let handle = scheduler.start();
    sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;

    assert!(calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_zero_interval_is_raised_to_minimum() {
    let job = counting("eager");
    let mut scheduler = PollScheduler::new();
    scheduler.add(job.clone(), Duration::ZERO, Duration::ZERO);

    let handle = scheduler.start();
    sleep(Duration::from_millis(20)).await;
    handle.shutdown().await;

    assert!(job.calls.load(Ordering::SeqCst) >= 1);
}
