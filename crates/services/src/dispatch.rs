use oddspulse_models::OddsField;
use serde::{Deserialize, Serialize};

/// Mutations the match store accepts from its drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MatchAction {
    UpdateRandomOdds,
    #[serde(rename_all = "camelCase")]
    UpdateSpecificOdds {
        match_id: String,
        field: OddsField,
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    ClearHighlight { match_id: String },
}

/// Seam between the timers and the store they drive.
#[cfg_attr(test, mockall::automock)]
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, action: MatchAction);
}
