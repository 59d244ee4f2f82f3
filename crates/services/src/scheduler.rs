use oddspulse_models::{PulseError, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::{ActionDispatcher, MatchAction};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub update_interval: Duration,
    /// Safety valve against unbounded background work.
    pub max_updates: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(3),
            max_updates: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub update_count: u64,
    pub max_updates: u64,
    pub interval_ms: u64,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct SchedulerState {
    running: Option<Running>,
    update_interval: Duration,
    update_count: u64,
}

struct Inner {
    dispatcher: Arc<dyn ActionDispatcher>,
    max_updates: u64,
    state: Mutex<SchedulerState>,
}

/// Drives random odds changes at a fixed cadence.
///
/// Ticks are checked and dispatched under the state lock, so once `stop`
/// returns no further update can be dispatched by the old timer.
#[derive(Clone)]
pub struct OddsUpdateScheduler {
    inner: Arc<Inner>,
}

impl OddsUpdateScheduler {
    pub fn new(dispatcher: Arc<dyn ActionDispatcher>, config: SchedulerConfig) -> Result<Self> {
        validate_interval(config.update_interval)?;
        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher,
                max_updates: config.max_updates,
                state: Mutex::new(SchedulerState {
                    running: None,
                    update_interval: config.update_interval,
                    update_count: 0,
                }),
            }),
        })
    }

    /// Starts (or restarts) the recurring trigger and resets the counter.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        if let Some(previous) = state.running.take() {
            stop_running(previous, state.update_count);
        }

        state.update_count = 0;
        let period = state.update_interval;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_ticks(
            Arc::downgrade(&self.inner),
            cancel.clone(),
            period,
        ));
        state.running = Some(Running { cancel, task });

        info!(
            "🔄 Odds pulse started - updating every {} seconds",
            format_secs(period)
        );
    }

    /// Cancels the recurring trigger. Safe to call when already idle.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if let Some(running) = state.running.take() {
            stop_running(running, state.update_count);
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running.is_some()
    }

    /// Fires one update immediately. Ignored while idle or at the cap.
    pub fn trigger_update(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.running.is_none() {
            debug!("Manual odds update ignored - scheduler is idle");
            return false;
        }
        if state.update_count >= self.inner.max_updates {
            warn!("⚠️ Maximum updates reached, ignoring manual trigger");
            return false;
        }
        self.inner.dispatcher.dispatch(MatchAction::UpdateRandomOdds);
        state.update_count += 1;
        true
    }

    pub fn update_count(&self) -> u64 {
        self.inner.state.lock().update_count
    }

    pub fn reset_update_count(&self) {
        self.inner.state.lock().update_count = 0;
    }

    pub fn interval(&self) -> Duration {
        self.inner.state.lock().update_interval
    }

    /// Changes the cadence. A running scheduler restarts immediately with the
    /// new period, which also resets the counter.
    pub fn change_interval(&self, new_interval: Duration) -> Result<()> {
        validate_interval(new_interval)?;
        let was_running = {
            let mut state = self.inner.state.lock();
            state.update_interval = new_interval;
            state.running.is_some()
        };
        if was_running {
            self.stop();
            self.start();
        }
        Ok(())
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = self.inner.state.lock();
        SchedulerStatus {
            running: state.running.is_some(),
            update_count: state.update_count,
            max_updates: self.inner.max_updates,
            interval_ms: u64::try_from(state.update_interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Final teardown: stop and forget the count.
    pub fn destroy(&self) {
        self.stop();
        self.reset_update_count();
    }
}

fn validate_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(PulseError::InvalidInterval { interval_ms: 0 });
    }
    Ok(())
}

fn stop_running(running: Running, update_count: u64) {
    running.cancel.cancel();
    running.task.abort();
    info!("⏹️ Odds pulse stopped after {} updates", update_count);
}

fn format_secs(period: Duration) -> String {
    let secs = period.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        format!("{secs:.2}")
    }
}

async fn run_ticks(weak: Weak<Inner>, cancel: CancellationToken, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !on_tick(&inner, &cancel) {
            break;
        }
    }
}

/// Handles one tick under the state lock. Returns whether to keep ticking.
fn on_tick(inner: &Inner, cancel: &CancellationToken) -> bool {
    let mut state = inner.state.lock();
    if cancel.is_cancelled() {
        return false;
    }

    if state.update_count >= inner.max_updates {
        warn!("⚠️ Maximum updates reached, stopping service");
        if let Some(running) = state.running.take() {
            running.cancel.cancel();
            info!("⏹️ Odds pulse stopped after {} updates", state.update_count);
        }
        return false;
    }

    inner.dispatcher.dispatch(MatchAction::UpdateRandomOdds);
    state.update_count += 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockActionDispatcher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingDispatcher {
        updates: AtomicUsize,
    }

    impl ActionDispatcher for CountingDispatcher {
        fn dispatch(&self, action: MatchAction) {
            assert_eq!(action, MatchAction::UpdateRandomOdds);
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CountingDispatcher {
        fn count(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    fn scheduler(interval_ms: u64, max_updates: u64) -> (OddsUpdateScheduler, Arc<CountingDispatcher>) {
        let dispatcher = Arc::new(CountingDispatcher::default());
        let scheduler = OddsUpdateScheduler::new(
            dispatcher.clone(),
            SchedulerConfig {
                update_interval: Duration::from_millis(interval_ms),
                max_updates,
            },
        )
        .unwrap();
        (scheduler, dispatcher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.update_count(), 0);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(dispatcher.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_interval() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        scheduler.start();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(dispatcher.count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(dispatcher.count(), 1);

        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert_eq!(dispatcher.count(), 3);
        assert_eq!(scheduler.update_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_updates() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(6100)).await;
        assert_eq!(dispatcher.count(), 2);

        scheduler.stop();
        assert!(!scheduler.is_running());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(dispatcher.count(), 2);

        // idempotent
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_counter_and_keeps_single_timer() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(scheduler.update_count(), 1);

        scheduler.start();
        assert_eq!(scheduler.update_count(), 0);
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(scheduler.update_count(), 1);
        assert_eq!(dispatcher.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_stops_at_cap() {
        let (scheduler, dispatcher) = scheduler(10, 1000);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(10 * 1000 + 5)).await;
        assert_eq!(dispatcher.count(), 1000);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!scheduler.is_running());
        assert_eq!(dispatcher.count(), 1000);
        assert_eq!(scheduler.update_count(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_update_only_while_running() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        assert!(!scheduler.trigger_update());
        assert_eq!(dispatcher.count(), 0);

        scheduler.start();
        assert!(scheduler.trigger_update());
        assert_eq!(dispatcher.count(), 1);
        assert_eq!(scheduler.update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_update_dispatches_random_update() {
        let mut mock = MockActionDispatcher::new();
        mock.expect_dispatch()
            .withf(|action| *action == MatchAction::UpdateRandomOdds)
            .times(1)
            .return_const(());
        let scheduler = OddsUpdateScheduler::new(Arc::new(mock), SchedulerConfig::default()).unwrap();

        scheduler.start();
        scheduler.trigger_update();
        scheduler.destroy();
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_interval_restarts_running_scheduler() {
        let (scheduler, dispatcher) = scheduler(3000, 1000);
        scheduler.start();
        scheduler.trigger_update();
        assert_eq!(scheduler.update_count(), 1);

        scheduler.change_interval(Duration::from_millis(500)).unwrap();
        assert!(scheduler.is_running());
        assert_eq!(scheduler.update_count(), 0);
        assert_eq!(scheduler.interval(), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(scheduler.update_count(), 2);
        assert_eq!(dispatcher.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_interval_while_idle_stays_idle() {
        let (scheduler, _) = scheduler(3000, 1000);
        scheduler.change_interval(Duration::from_secs(1)).unwrap();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.interval(), Duration::from_secs(1));
        assert_eq!(
            scheduler.change_interval(Duration::ZERO),
            Err(PulseError::InvalidInterval { interval_ms: 0 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_resets_everything() {
        let (scheduler, dispatcher) = scheduler(1000, 1000);
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.destroy();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.update_count(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(dispatcher.count(), 2);
        scheduler.destroy();
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = OddsUpdateScheduler::new(
            Arc::new(CountingDispatcher::default()),
            SchedulerConfig {
                update_interval: Duration::ZERO,
                max_updates: 10,
            },
        );
        assert!(result.is_err());
    }
}
