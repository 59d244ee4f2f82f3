//! Derived views over the board.
//!
//! Each selector caches its last result keyed on the identity of exactly the
//! snapshots it reads, so asking again with unchanged inputs hands back the
//! same `Arc` without recomputing.

use oddspulse_models::{FilterCriteria, Match, MatchesState, SortDirection, SortKey};
use parking_lot::Mutex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

pub type MatchList = Vec<Arc<Match>>;

trait SameInput {
    fn same_input(&self, other: &Self) -> bool;
}

impl<T> SameInput for Arc<T> {
    fn same_input(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<A: SameInput, B: SameInput> SameInput for (A, B) {
    fn same_input(&self, other: &Self) -> bool {
        self.0.same_input(&other.0) && self.1.same_input(&other.1)
    }
}

/// Single-slot cache. Holding the key keeps the input alive, so a freed and
/// reused allocation can never produce a false hit.
struct Memo<K, V> {
    slot: Mutex<Option<(K, Arc<V>)>>,
}

impl<K: SameInput + Clone, V> Memo<K, V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn get_or_compute(
        &self,
        key: &K,
        computations: &AtomicUsize,
        compute: impl FnOnce() -> V,
    ) -> Arc<V> {
        let mut slot = self.slot.lock();
        if let Some((cached_key, value)) = slot.as_ref() {
            if cached_key.same_input(key) {
                return Arc::clone(value);
            }
        }
        computations.fetch_add(1, AtomicOrdering::Relaxed);
        let value = Arc::new(compute());
        *slot = Some((key.clone(), Arc::clone(&value)));
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStatus {
    pub total_matches: usize,
    pub filtered_matches: usize,
    pub has_active_filters: bool,
    pub is_filtered: bool,
    pub sort_by: Option<SortKey>,
    pub sort_direction: SortDirection,
}

/// Everything the board needs to render one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub matches: Arc<MatchList>,
    pub leagues: Arc<Vec<String>>,
    pub dates: Arc<Vec<String>>,
    pub status: FilterStatus,
}

pub struct DerivedViewEngine {
    filtered: Memo<(Arc<MatchesState>, Arc<FilterCriteria>), MatchList>,
    sorted: Memo<(Arc<MatchList>, Arc<FilterCriteria>), MatchList>,
    leagues: Memo<Arc<MatchesState>, Vec<String>>,
    dates: Memo<Arc<MatchesState>, Vec<String>>,
    computations: AtomicUsize,
}

impl DerivedViewEngine {
    pub fn new() -> Self {
        Self {
            filtered: Memo::new(),
            sorted: Memo::new(),
            leagues: Memo::new(),
            dates: Memo::new(),
            computations: AtomicUsize::new(0),
        }
    }

    /// How many times any selector actually recomputed.
    pub fn computations(&self) -> usize {
        self.computations.load(AtomicOrdering::Relaxed)
    }

    pub fn filtered_matches(
        &self,
        matches: &Arc<MatchesState>,
        criteria: &Arc<FilterCriteria>,
    ) -> Arc<MatchList> {
        let key = (Arc::clone(matches), Arc::clone(criteria));
        self.filtered
            .get_or_compute(&key, &self.computations, || filter_matches(matches, criteria))
    }

    /// The filtered list in display order. Without a sort key this is the
    /// filtered list itself.
    pub fn sorted_and_filtered(
        &self,
        matches: &Arc<MatchesState>,
        criteria: &Arc<FilterCriteria>,
    ) -> Arc<MatchList> {
        let filtered = self.filtered_matches(matches, criteria);
        if criteria.sort_by.is_none() {
            return filtered;
        }
        let key = (Arc::clone(&filtered), Arc::clone(criteria));
        self.sorted
            .get_or_compute(&key, &self.computations, || sort_matches(&filtered, criteria))
    }

    pub fn unique_leagues(&self, matches: &Arc<MatchesState>) -> Arc<Vec<String>> {
        self.leagues.get_or_compute(matches, &self.computations, || {
            distinct_sorted(matches.matches().iter().map(|m| m.league.as_str()))
        })
    }

    pub fn unique_dates(&self, matches: &Arc<MatchesState>) -> Arc<Vec<String>> {
        self.dates.get_or_compute(matches, &self.computations, || {
            distinct_sorted(matches.matches().iter().map(|m| m.date.as_str()))
        })
    }

    pub fn filtered_count(
        &self,
        matches: &Arc<MatchesState>,
        criteria: &Arc<FilterCriteria>,
    ) -> usize {
        self.filtered_matches(matches, criteria).len()
    }

    pub fn filter_status(
        &self,
        matches: &Arc<MatchesState>,
        criteria: &Arc<FilterCriteria>,
    ) -> FilterStatus {
        let total_matches = matches.len();
        let filtered_matches = self.filtered_count(matches, criteria);
        FilterStatus {
            total_matches,
            filtered_matches,
            has_active_filters: criteria.has_active_filters(),
            is_filtered: filtered_matches < total_matches,
            sort_by: criteria.sort_by,
            sort_direction: criteria.sort_direction,
        }
    }

    pub fn view(&self, matches: &Arc<MatchesState>, criteria: &Arc<FilterCriteria>) -> DerivedView {
        DerivedView {
            matches: self.sorted_and_filtered(matches, criteria),
            leagues: self.unique_leagues(matches),
            dates: self.unique_dates(matches),
            status: self.filter_status(matches, criteria),
        }
    }
}

impl Default for DerivedViewEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn match_passes(fixture: &Match, criteria: &FilterCriteria) -> bool {
    if criteria.team_search_active() {
        let needle = criteria.team_search.to_lowercase();
        let home_hit = fixture.home_team.to_lowercase().contains(&needle);
        let away_hit = fixture.away_team.to_lowercase().contains(&needle);
        if !home_hit && !away_hit {
            return false;
        }
    }
    if criteria.date_filter_active() && fixture.date != criteria.date_filter {
        return false;
    }
    if criteria.league_filter_active() && fixture.league != criteria.league_filter {
        return false;
    }
    true
}

pub fn filter_matches(matches: &MatchesState, criteria: &FilterCriteria) -> MatchList {
    matches
        .matches()
        .iter()
        .filter(|m| match_passes(m, criteria))
        .cloned()
        .collect()
}

/// Stable sort by the criteria's key; ties keep their filtered order in both
/// directions.
pub fn sort_matches(matches: &[Arc<Match>], criteria: &FilterCriteria) -> MatchList {
    let mut sorted = matches.to_vec();
    let Some(key) = criteria.sort_by else {
        return sorted;
    };
    sorted.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => compare_dates(a, b),
            SortKey::Team => compare_text(&a.home_team, &b.home_team),
            SortKey::League => compare_text(&a.league, &b.league),
        };
        match criteria.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Chronological; dates that do not parse go last and tie with each other.
fn compare_dates(a: &Match, b: &Match) -> Ordering {
    match (a.kickoff_date(), b.kickoff_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive first, lowercase before uppercase on a tie.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
