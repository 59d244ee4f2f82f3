use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use oddspulse_models::OddsField;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::dispatch::{ActionDispatcher, MatchAction};

pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_secs(2);

struct PendingClear {
    token: u64,
    task: JoinHandle<()>,
}

struct Inner {
    dispatcher: Arc<dyn ActionDispatcher>,
    clear_delay: Duration,
    pending: DashMap<String, PendingClear>,
    next_token: AtomicU64,
    disposed: AtomicBool,
}

impl Inner {
    /// Runs when a timer elapses. Only the timer still registered for the id
    /// may clear it, which makes a superseded timer inert even if it already
    /// woke up before being aborted.
    fn fire(&self, match_id: &str, token: u64) {
        let owned = self
            .pending
            .remove_if(match_id, |_, pending| pending.token == token)
            .is_some();
        if owned && !self.disposed.load(Ordering::Acquire) {
            self.dispatcher.dispatch(MatchAction::ClearHighlight {
                match_id: match_id.to_string(),
            });
        }
    }
}

/// Clears "recently updated" flags a fixed delay after each change.
///
/// Clones share one timer map, so every holder drives the same timers.
/// Repeated updates to one match coalesce into a single clear scheduled from
/// the latest update.
#[derive(Clone)]
pub struct HighlightLifecycle {
    inner: Arc<Inner>,
}

impl HighlightLifecycle {
    pub fn new(dispatcher: Arc<dyn ActionDispatcher>, clear_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                clear_delay,
                pending: DashMap::new(),
                next_token: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn clear_delay(&self) -> Duration {
        self.inner.clear_delay
    }

    /// (Re)schedules the clear for `match_id`. Does nothing when no field is
    /// flagged or after `cleanup`.
    pub fn trigger_highlight_clear(&self, match_id: &str, updated_field: Option<OddsField>) {
        let Some(field) = updated_field else {
            return;
        };
        if self.is_disposed() {
            debug!("Highlight clear for {} ignored after cleanup", match_id);
            return;
        }

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        // The shard stays locked until the new entry is in place, so the
        // timer cannot look itself up before it is registered.
        match self.inner.pending.entry(match_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let task = self.spawn_timer(match_id, token);
                let previous = occupied.insert(PendingClear { token, task });
                previous.task.abort();
                debug!("🔁 Rescheduled highlight clear for {} ({})", match_id, field);
            }
            Entry::Vacant(vacant) => {
                let task = self.spawn_timer(match_id, token);
                vacant.insert(PendingClear { token, task });
                debug!("⏱️ Scheduled highlight clear for {} ({})", match_id, field);
            }
        }
    }

    fn spawn_timer(&self, match_id: &str, token: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let match_id = match_id.to_string();
        tokio::spawn(async move {
            sleep(inner.clear_delay).await;
            inner.fire(&match_id, token);
        })
    }

    /// Cancels every pending clear and makes late timers inert. Idempotent.
    pub fn cleanup(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        let mut cancelled = 0usize;
        self.inner.pending.retain(|_, pending| {
            pending.task.abort();
            cancelled += 1;
            false
        });
        if cancelled > 0 {
            debug!("🧹 Cancelled {} pending highlight clears", cancelled);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn is_pending(&self, match_id: &str) -> bool {
        self.inner.pending.contains_key(match_id)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}
