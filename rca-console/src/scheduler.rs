use api_structs::time_conversion::{minutes_to_millis, MILLIS_IN_1_SEC, SECS_IN_1_MIN};
use chrono::{NaiveTime, Timelike};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};

pub const SYNC_PERIOD_MINUTES: u64 = 5;
pub const SYNC_PERIOD: Duration = Duration::from_millis(minutes_to_millis(SYNC_PERIOD_MINUTES));

/// Source of the wall clock time the schedule aligns to.
pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> NaiveTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl WallClock for LocalClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Always answers the same time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl WallClock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

/// Time left until the next multiple of [`SYNC_PERIOD_MINUTES`] past the hour.
/// Zero when `now` sits exactly on a boundary, always below [`SYNC_PERIOD`].
pub fn delay_until_next_sync(now: NaiveTime) -> Duration {
    let period_ms = minutes_to_millis(SYNC_PERIOD_MINUTES);
    // leap seconds report nanosecond >= 1_000_000_000
    let millis_in_second = u64::from((now.nanosecond() / 1_000_000).min(999));
    let millis_into_hour = (u64::from(now.minute()) * SECS_IN_1_MIN + u64::from(now.second()))
        * MILLIS_IN_1_SEC
        + millis_in_second;
    let millis_into_period = millis_into_hour % period_ms;
    if millis_into_period == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(period_ms - millis_into_period)
    }
}

/// Running refresh schedule. Dropping it stops the schedule as well.
#[derive(Debug)]
pub struct ScheduleHandle {
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Cancels the pending first sync or the recurring one, whichever is active.
    /// A poll in flight is dropped at its next suspension point and never applied.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Polls once right away, once more on the next wall clock boundary and then
/// every [`SYNC_PERIOD`]. Polls never overlap each other, a slow poll delays the
/// following tick instead of bunching ticks up.
pub fn start_refresh_schedule<W, F, Fut>(clock: W, poll: F) -> ScheduleHandle
where
    W: WallClock,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let delay = delay_until_next_sync(clock.now());
    let first_sync_at = Instant::now() + delay;
    info!(
        "First aligned sync in {}ms, then every {} minutes",
        delay.as_millis(),
        SYNC_PERIOD_MINUTES
    );
    let task = tokio::spawn(
        async move {
            poll().await;
            tokio::time::sleep_until(first_sync_at).await;
            debug!("Running first aligned sync");
            poll().await;
            let mut interval = tokio::time::interval_at(first_sync_at + SYNC_PERIOD, SYNC_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                debug!("Running periodic sync");
                poll().await;
            }
        }
        .instrument(info_span!("refresh_schedule")),
    );
    ScheduleHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn delay_for_known_times() {
        assert_eq!(delay_until_next_sync(at(10, 2, 30)), Duration::from_millis(150_000));
        assert_eq!(delay_until_next_sync(at(10, 0, 0)), Duration::ZERO);
        assert_eq!(delay_until_next_sync(at(10, 0, 30)), Duration::from_secs(270));
        assert_eq!(delay_until_next_sync(at(10, 59, 59)), Duration::from_secs(1));
        assert_eq!(
            delay_until_next_sync(NaiveTime::from_hms_milli_opt(10, 4, 59, 250).unwrap()),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn delay_lands_on_boundary_for_every_second_of_the_hour() {
        for minute in 0..60 {
            for second in 0..60 {
                let now = at(13, minute, second);
                let delay = delay_until_next_sync(now);
                assert!(delay < SYNC_PERIOD, "{now}: {delay:?}");
                let landing_secs = u64::from(minute * 60 + second) + delay.as_secs();
                assert_eq!(delay.subsec_nanos(), 0);
                assert_eq!(landing_secs % (SYNC_PERIOD_MINUTES * 60), 0, "{now}");
            }
        }
    }

    fn counting_poll() -> (Arc<AtomicUsize>, impl Fn() -> std::future::Ready<()> + Send + Sync) {
        let count = Arc::new(AtomicUsize::new(0));
        let poll_count = Arc::clone(&count);
        let poll = move || {
            poll_count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        };
        (count, poll)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_boundary_then_every_period() {
        let (count, poll) = counting_poll();
        let _handle = start_refresh_schedule(FixedClock(at(10, 2, 30)), poll);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(149)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(SYNC_PERIOD).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        tokio::time::sleep(SYNC_PERIOD * 3).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn on_boundary_start_polls_twice_right_away() {
        let (count, poll) = counting_poll();
        let _handle = start_refresh_schedule(FixedClock(at(10, 0, 0)), poll);
        tokio::time::sleep(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(SYNC_PERIOD - Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_pending_and_recurring_polls() {
        let (count, poll) = counting_poll();
        let handle = start_refresh_schedule(FixedClock(at(10, 2, 30)), poll);
        settle().await;
        handle.shutdown();
        tokio::time::sleep(SYNC_PERIOD * 4).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }
}
