use oddspulse_models::{Match, MatchesState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::highlight::HighlightLifecycle;

/// Matches in `next` that carry a fresh change relative to `prev`: a flagged
/// field whose revision differs from what `prev` held for the same id.
pub fn newly_updated(prev: &MatchesState, next: &MatchesState) -> Vec<Arc<Match>> {
    let previous: HashMap<&str, u64> = prev
        .matches()
        .iter()
        .map(|m| (m.id.as_str(), m.revision))
        .collect();

    next.matches()
        .iter()
        .filter(|m| m.updated_field.is_some())
        .filter(|m| previous.get(m.id.as_str()) != Some(&m.revision))
        .cloned()
        .collect()
}

/// Forwards every fresh change on the store to the highlight manager until
/// the store goes away.
pub fn spawn_highlight_feed(
    mut updates: watch::Receiver<Arc<MatchesState>>,
    highlights: HighlightLifecycle,
) -> JoinHandle<()> {
    // Baseline is read before the spawn; anything published after it is fresh.
    let mut prev = updates.borrow_and_update().clone();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let next = updates.borrow_and_update().clone();
            for fixture in newly_updated(&prev, &next) {
                highlights.trigger_highlight_clear(&fixture.id, fixture.updated_field);
            }
            prev = next;
        }
        debug!("Highlight feed closed");
    })
}
