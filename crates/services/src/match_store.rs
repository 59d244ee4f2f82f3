use oddspulse_models::{Match, MatchesState, OddsField, OddsUpdate};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::dispatch::{ActionDispatcher, MatchAction};

/// Owner of the authoritative board.
///
/// Every effective mutation publishes a new `Arc<MatchesState>` on a watch
/// channel; no-ops publish nothing, so snapshot identity only changes with
/// content.
pub struct MatchStore {
    state: watch::Sender<Arc<MatchesState>>,
    rng: Mutex<StdRng>,
}

impl MatchStore {
    pub fn new(initial: MatchesState) -> Self {
        Self::with_rng(initial, StdRng::from_entropy())
    }

    pub fn with_rng(initial: MatchesState, rng: StdRng) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        Self {
            state,
            rng: Mutex::new(rng),
        }
    }

    pub fn seeded() -> Self {
        Self::new(MatchesState::seeded())
    }

    pub fn snapshot(&self) -> Arc<MatchesState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MatchesState>> {
        self.state.subscribe()
    }

    pub fn match_by_id(&self, match_id: &str) -> Option<Arc<Match>> {
        self.state.borrow().get(match_id).cloned()
    }

    pub fn is_updating(&self) -> bool {
        self.state.borrow().is_updating()
    }

    /// Re-prices a random field of a random match. Returns the applied change,
    /// or `None` on an empty board.
    pub fn apply_random_update(&self) -> Option<OddsUpdate> {
        let mut applied = None;
        self.state.send_if_modified(|current| {
            let mut rng = self.rng.lock();
            match current.with_random_update(&mut *rng, now_millis()) {
                Some((next, update)) => {
                    *current = Arc::new(next);
                    applied = Some(update);
                    true
                }
                None => false,
            }
        });

        if let Some(update) = &applied {
            debug!(
                "📈 {} {} odds -> {}",
                update.match_id, update.field, update.value
            );
        }
        applied
    }

    /// Sets `value` verbatim. Returns whether a match with `match_id` existed.
    pub fn apply_specific_update(&self, match_id: &str, field: OddsField, value: &str) -> bool {
        let applied = self.state.send_if_modified(|current| {
            match current.with_specific_update(match_id, field, value, now_millis()) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });

        if applied {
            debug!("✏️ {} {} odds set to {}", match_id, field, value);
        }
        applied
    }

    /// Drops the highlight on `match_id`. Returns whether anything changed.
    pub fn clear_highlight(&self, match_id: &str) -> bool {
        let cleared = self.state.send_if_modified(|current| {
            match current.with_highlight_cleared(match_id) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });

        if cleared {
            debug!("✨ Cleared highlight on {}", match_id);
        }
        cleared
    }
}

impl Default for MatchStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ActionDispatcher for MatchStore {
    fn dispatch(&self, action: MatchAction) {
        match action {
            MatchAction::UpdateRandomOdds => {
                self.apply_random_update();
            }
            MatchAction::UpdateSpecificOdds {
                match_id,
                field,
                value,
            } => {
                self.apply_specific_update(&match_id, field, &value);
            }
            MatchAction::ClearHighlight { match_id } => {
                self.clear_highlight(&match_id);
            }
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MatchStore {
        MatchStore::with_rng(MatchesState::seeded(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_random_update_publishes_new_snapshot() {
        let store = store();
        let before = store.snapshot();
        let started = chrono::Utc::now().timestamp_millis();

        let update = store.apply_random_update().unwrap();
        let after = store.snapshot();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(store.is_updating());
        let changed = after.get(&update.match_id).unwrap();
        assert_eq!(changed.updated_field, Some(update.field));
        assert!(changed.last_updated >= started);
        assert_eq!(changed.last_updated, update.timestamp);
    }

    #[test]
    fn test_random_update_on_empty_store() {
        let store = MatchStore::new(MatchesState::default());
        let before = store.snapshot();
        assert!(store.apply_random_update().is_none());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_noops_keep_snapshot_identity() {
        let store = store();
        let before = store.snapshot();

        assert!(!store.apply_specific_update("999", OddsField::Home, "2.50"));
        assert!(!store.clear_highlight("999"));
        assert!(!store.clear_highlight("1"));

        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_dispatch_routes_actions() {
        let store = store();
        store.dispatch(MatchAction::UpdateSpecificOdds {
            match_id: "5".to_string(),
            field: OddsField::Draw,
            value: "2.95".to_string(),
        });
        let fixture = store.match_by_id("5").unwrap();
        assert_eq!(fixture.draw_odds, "2.95");
        assert_eq!(fixture.updated_field, Some(OddsField::Draw));

        store.dispatch(MatchAction::ClearHighlight {
            match_id: "5".to_string(),
        });
        let fixture = store.match_by_id("5").unwrap();
        assert_eq!(fixture.updated_field, None);
        assert_eq!(fixture.draw_odds, "2.95");
        assert!(!store.is_updating());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = store();
        let mut rx = store.subscribe();

        store.apply_specific_update("1", OddsField::Away, "2.05");
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.get("1").unwrap().away_odds, "2.05");

        store.clear_highlight("999");
        assert!(!rx.has_changed().unwrap());
    }
}
