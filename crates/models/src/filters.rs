use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PulseError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Team,
    League,
}

impl FromStr for SortKey {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "team" => Ok(SortKey::Team),
            "league" => Ok(SortKey::League),
            other => Err(PulseError::InvalidSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Date => "date",
            SortKey::Team => "team",
            SortKey::League => "league",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(PulseError::InvalidSortDirection(other.to_string())),
        }
    }
}

/// What the user asked the board to show. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub team_search: String,
    pub date_filter: String,
    pub league_filter: String,
    pub sort_by: Option<SortKey>,
    pub sort_direction: SortDirection,
}

impl FilterCriteria {
    /// Same key twice in a row flips the direction; anything else restarts
    /// at ascending.
    pub fn set_sort_by(&mut self, key: Option<SortKey>) {
        self.sort_direction = match key {
            Some(_) if key == self.sort_by => self.sort_direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.sort_by = key;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn team_search_active(&self) -> bool {
        !self.team_search.trim().is_empty()
    }

    pub fn date_filter_active(&self) -> bool {
        !self.date_filter.trim().is_empty()
    }

    pub fn league_filter_active(&self) -> bool {
        !self.league_filter.trim().is_empty()
    }

    pub fn has_active_filters(&self) -> bool {
        self.team_search_active()
            || self.date_filter_active()
            || self.league_filter_active()
            || self.sort_by.is_some()
    }
}
