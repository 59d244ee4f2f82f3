use oddspulse_models::{FilterCriteria, SortDirection, SortKey};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Holds the user's filter and sort choices.
///
/// Each setter swaps in a new snapshot only when the criteria actually change.
#[derive(Default)]
pub struct FilterStore {
    criteria: RwLock<Arc<FilterCriteria>>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<FilterCriteria> {
        self.criteria.read().clone()
    }

    fn update(&self, apply: impl FnOnce(&mut FilterCriteria)) -> Arc<FilterCriteria> {
        let mut guard = self.criteria.write();
        let mut next = FilterCriteria::clone(&guard);
        apply(&mut next);
        if next != **guard {
            debug!("🔎 Filters changed: {:?}", next);
            *guard = Arc::new(next);
        }
        guard.clone()
    }

    pub fn set_team_search(&self, search: impl Into<String>) -> Arc<FilterCriteria> {
        let search = search.into();
        self.update(|c| c.team_search = search)
    }

    pub fn set_date_filter(&self, date: impl Into<String>) -> Arc<FilterCriteria> {
        let date = date.into();
        self.update(|c| c.date_filter = date)
    }

    pub fn set_league_filter(&self, league: impl Into<String>) -> Arc<FilterCriteria> {
        let league = league.into();
        self.update(|c| c.league_filter = league)
    }

    pub fn set_sort_by(&self, key: Option<SortKey>) -> Arc<FilterCriteria> {
        self.update(|c| c.set_sort_by(key))
    }

    pub fn set_sort_direction(&self, direction: SortDirection) -> Arc<FilterCriteria> {
        self.update(|c| c.sort_direction = direction)
    }

    pub fn clear_all_filters(&self) -> Arc<FilterCriteria> {
        self.update(FilterCriteria::clear)
    }
}
