use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fixture::{seed_matches, Match};
use crate::odds::{format_odds, random_odds, OddsField};

/// A single applied price change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsUpdate {
    pub match_id: String,
    pub field: OddsField,
    pub value: String,
    pub timestamp: i64,
}

/// Price-only projection of a match, used to compare boards cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsValues {
    pub id: String,
    pub home_odds: String,
    pub draw_odds: String,
    pub away_odds: String,
    pub updated_field: Option<OddsField>,
    pub last_updated: i64,
}

/// Immutable snapshot of the board.
///
/// Transitions never mutate a snapshot in place: they return a new one in
/// which only the touched entry is a fresh allocation, so readers can detect
/// "nothing relevant changed" with `Arc::ptr_eq` on the whole snapshot or on
/// individual entries. Transitions that change nothing return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchesState {
    matches: Vec<Arc<Match>>,
    /// Bumped by every price change; stamped on the re-priced entry.
    revision: u64,
}

impl MatchesState {
    pub fn new(matches: Vec<Match>) -> Self {
        Self {
            matches: matches.into_iter().map(Arc::new).collect(),
            revision: 0,
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_matches())
    }

    pub fn matches(&self) -> &[Arc<Match>] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, match_id: &str) -> Option<&Arc<Match>> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    fn position(&self, match_id: &str) -> Option<usize> {
        self.matches.iter().position(|m| m.id == match_id)
    }

    /// Number of matches whose highlight is still set.
    pub fn updating_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_highlighted()).count()
    }

    /// True while at least one match carries a highlighted field.
    pub fn is_updating(&self) -> bool {
        self.matches.iter().any(|m| m.is_highlighted())
    }

    pub fn updated_matches(&self) -> Vec<Arc<Match>> {
        self.matches
            .iter()
            .filter(|m| m.is_highlighted())
            .cloned()
            .collect()
    }

    /// The most recently updated match. Ties and an untouched board resolve to
    /// the earliest entry.
    pub fn last_updated_match(&self) -> Option<&Arc<Match>> {
        self.matches.iter().fold(None, |latest: Option<&Arc<Match>>, current| match latest {
            Some(latest) if current.last_updated <= latest.last_updated => Some(latest),
            _ => Some(current),
        })
    }

    pub fn odds_values(&self) -> Vec<OddsValues> {
        self.matches
            .iter()
            .map(|m| OddsValues {
                id: m.id.clone(),
                home_odds: m.home_odds.clone(),
                draw_odds: m.draw_odds.clone(),
                away_odds: m.away_odds.clone(),
                updated_field: m.updated_field,
                last_updated: m.last_updated,
            })
            .collect()
    }

    fn replace_at(&self, index: usize, entry: Match, revision: u64) -> Self {
        let mut matches = self.matches.clone();
        matches[index] = Arc::new(entry);
        Self { matches, revision }
    }

    fn reprice(&self, index: usize, field: OddsField, value: String, now_ms: i64) -> Self {
        let revision = self.revision + 1;
        let mut entry = Match::clone(&self.matches[index]);
        entry.set_odds(field, value, now_ms);
        entry.revision = revision;
        self.replace_at(index, entry, revision)
    }

    /// Re-prices a uniformly chosen field of a uniformly chosen match.
    pub fn with_random_update<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now_ms: i64,
    ) -> Option<(Self, OddsUpdate)> {
        if self.matches.is_empty() {
            return None;
        }

        let index = rng.gen_range(0..self.matches.len());
        let field = OddsField::random(rng);
        let value = format_odds(random_odds(rng));

        let next = self.reprice(index, field, value.clone(), now_ms);
        let entry = &next.matches[index];
        let update = OddsUpdate {
            match_id: entry.id.clone(),
            field,
            value,
            timestamp: entry.last_updated,
        };

        Some((next, update))
    }

    /// Assigns `value` verbatim. Unknown ids change nothing.
    pub fn with_specific_update(
        &self,
        match_id: &str,
        field: OddsField,
        value: &str,
        now_ms: i64,
    ) -> Option<Self> {
        let index = self.position(match_id)?;
        Some(self.reprice(index, field, value.to_string(), now_ms))
    }

    /// Drops the highlight on one match, keeping its prices and timestamp.
    pub fn with_highlight_cleared(&self, match_id: &str) -> Option<Self> {
        let index = self.position(match_id)?;
        if self.matches[index].updated_field.is_none() {
            return None;
        }
        let mut entry = Match::clone(&self.matches[index]);
        entry.updated_field = None;
        Some(self.replace_at(index, entry, self.revision))
    }
}
