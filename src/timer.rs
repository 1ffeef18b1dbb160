//! Recurring timer driving periodic samples

use crate::errors::ExporterResult;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::panic;
use std::thread;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::warn;

/// Handle to a running sampling timer
///
/// Runs as a task when created inside a tokio runtime with timers enabled and
/// on a dedicated thread otherwise. The first tick fires one full period after
/// start.
pub(crate) enum SamplingTimer {
    Task(tokio::task::JoinHandle<()>),
    Thread {
        stop: Sender<()>,
        handle: thread::JoinHandle<()>,
    },
}

impl SamplingTimer {
    pub fn start<F>(period: Duration, mut tick: F) -> ExporterResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            match Self::task_interval(period) {
                Some(mut interval) => {
                    let task = runtime.spawn(async move {
                        loop {
                            interval.tick().await;
                            tick();
                        }
                    });
                    return Ok(SamplingTimer::Task(task));
                }
                None => warn!("Tokio runtime has timers disabled, sampling on a dedicated thread"),
            }
        }

        let (stop, stopped) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("pool-exporter".to_string())
            .spawn(move || {
                // Disconnect or an explicit message both end the loop.
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(period) {
                    tick();
                }
            })?;
        Ok(SamplingTimer::Thread { stop, handle })
    }

    /// Interval for the task timer, `None` when the current runtime has no time driver
    fn task_interval(period: Duration) -> Option<Interval> {
        // Tokio panics on timer creation when `enable_time` was not set.
        let mut interval = panic::catch_unwind(|| tokio::time::interval_at(Instant::now() + period, period)).ok()?;
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }

    /// Whether the timer is still firing
    pub fn is_active(&self) -> bool {
        match self {
            SamplingTimer::Task(task) => !task.is_finished(),
            SamplingTimer::Thread { handle, .. } => !handle.is_finished(),
        }
    }

    /// Stop the timer; a tick already running on the timer thread completes first
    pub fn cancel(self) {
        match self {
            SamplingTimer::Task(task) => task.abort(),
            SamplingTimer::Thread { stop, handle } => {
                let _ = stop.try_send(());
                drop(stop);
                if handle.thread().id() != thread::current().id() {
                    let _ = handle.join();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        (ticks, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_thread_timer_ticks_until_cancelled() {
        let (ticks, tick) = counter();
        let timer = SamplingTimer::start(Duration::from_millis(5), tick).unwrap();
        assert!(matches!(timer, SamplingTimer::Thread { .. }));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        timer.cancel();

        let after_cancel = ticks.load(Ordering::SeqCst);
        assert!(after_cancel >= 2);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_runtime_without_timers_falls_back_to_thread() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _context = runtime.enter();

        let (ticks, tick) = counter();
        let timer = SamplingTimer::start(Duration::from_millis(5), tick).unwrap();
        assert!(matches!(timer, SamplingTimer::Thread { .. }));
        assert!(timer.is_active());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) < 1 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        timer.cancel();

        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_timer_waits_a_full_period() {
        let (ticks, tick) = counter();
        let timer = SamplingTimer::start(Duration::from_secs(10), tick).unwrap();
        assert!(matches!(timer, SamplingTimer::Task(_)));
        assert!(timer.is_active());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
