use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::odds::OddsField;

/// One fixture on the board with its three live prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_odds: String,
    pub draw_odds: String,
    pub away_odds: String,
    pub date: String,
    pub time: String,
    pub league: String,
    pub partner1: String,
    pub partner2: String,
    pub updated_field: Option<OddsField>,
    /// Epoch milliseconds of the last price change, 0 when never updated.
    pub last_updated: i64,
    /// Board revision that last re-priced this match. Unlike `last_updated`
    /// it is unique per change, even within one millisecond.
    #[serde(skip)]
    pub revision: u64,
}

impl Match {
    pub fn new(
        id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        league: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_odds: "2.00".to_string(),
            draw_odds: "3.00".to_string(),
            away_odds: "2.00".to_string(),
            date: date.into(),
            time: time.into(),
            league: league.into(),
            partner1: String::new(),
            partner2: String::new(),
            updated_field: None,
            last_updated: 0,
            revision: 0,
        }
    }

    pub fn with_odds(mut self, home: &str, draw: &str, away: &str) -> Self {
        self.home_odds = home.to_string();
        self.draw_odds = draw.to_string();
        self.away_odds = away.to_string();
        self
    }

    pub fn with_partners(mut self, partner1: &str, partner2: &str) -> Self {
        self.partner1 = partner1.to_string();
        self.partner2 = partner2.to_string();
        self
    }

    pub fn odds(&self, field: OddsField) -> &str {
        match field {
            OddsField::Home => &self.home_odds,
            OddsField::Draw => &self.draw_odds,
            OddsField::Away => &self.away_odds,
        }
    }

    /// Assigns `value` to `field` and stamps the change metadata together.
    /// `last_updated` never moves backwards.
    pub fn set_odds(&mut self, field: OddsField, value: String, now_ms: i64) {
        match field {
            OddsField::Home => self.home_odds = value,
            OddsField::Draw => self.draw_odds = value,
            OddsField::Away => self.away_odds = value,
        }
        self.updated_field = Some(field);
        self.last_updated = now_ms.max(self.last_updated);
    }

    pub fn is_highlighted(&self) -> bool {
        self.updated_field.is_some()
    }

    /// Whether the price cell for `field` should currently render highlighted.
    pub fn is_field_highlighted(&self, field: OddsField) -> bool {
        self.updated_field == Some(field)
    }

    pub fn kickoff_date(&self) -> Option<NaiveDate> {
        parse_fixture_date(&self.date)
    }
}

const DATE_FORMATS: [&str; 4] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%d %b %Y"];

/// Parses board dates such as `Feb 2, 2024`.
pub fn parse_fixture_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

const LOGO_1: &str = "/assets/images/partnerLogos/logo1.jpg";
const LOGO_2: &str = "/assets/images/partnerLogos/logo2.jpg";
const LOGO_3: &str = "/assets/images/partnerLogos/logo3.jpg";

/// The fixtures the board starts with.
pub fn seed_matches() -> Vec<Match> {
    vec![
        Match::new("1", "Chelsea", "Liverpool", "Premier League", "Feb 2, 2024", "15:00")
            .with_odds("1.87", "3.20", "2.45")
            .with_partners(LOGO_1, LOGO_2),
        Match::new("2", "West Ham", "Arsenal", "Premier League", "Feb 2, 2024", "17:30")
            .with_odds("3.10", "3.40", "1.95")
            .with_partners(LOGO_2, LOGO_3),
        Match::new("3", "Manchester United", "Tottenham", "Premier League", "Feb 3, 2024", "14:00")
            .with_odds("2.20", "3.10", "2.80")
            .with_partners(LOGO_3, LOGO_1),
        Match::new("4", "Brighton", "Newcastle", "Premier League", "Feb 3, 2024", "16:30")
            .with_odds("2.60", "3.00", "2.40")
            .with_partners(LOGO_1, LOGO_2),
        Match::new("5", "Real Madrid", "Barcelona", "La Liga", "Feb 4, 2024", "20:00")
            .with_odds("2.10", "3.50", "2.90")
            .with_partners(LOGO_2, LOGO_3),
        Match::new("6", "Atletico Madrid", "Sevilla", "La Liga", "Feb 4, 2024", "18:00")
            .with_odds("1.75", "3.20", "4.50")
            .with_partners(LOGO_1, LOGO_2),
        Match::new("7", "Bayern Munich", "Borussia Dortmund", "Bundesliga", "Feb 5, 2024", "19:30")
            .with_odds("1.95", "3.80", "3.40")
            .with_partners(LOGO_3, LOGO_1),
        Match::new("8", "RB Leipzig", "Bayer Leverkusen", "Bundesliga", "Feb 5, 2024", "17:00")
            .with_odds("2.40", "3.10", "2.70")
            .with_partners(LOGO_2, LOGO_3),
        Match::new("9", "PSG", "Marseille", "Ligue 1", "Feb 6, 2024", "21:00")
            .with_odds("1.60", "3.90", "5.20")
            .with_partners(LOGO_1, LOGO_2),
        Match::new("10", "AC Milan", "Inter Milan", "Serie A", "Feb 6, 2024", "20:45")
            .with_odds("2.30", "3.20", "2.80")
            .with_partners(LOGO_3, LOGO_1),
        Match::new("11", "Juventus", "Napoli", "Serie A", "Feb 7, 2024", "19:00")
            .with_odds("2.80", "3.00", "2.50")
            .with_partners(LOGO_2, LOGO_3),
        Match::new("12", "Manchester City", "Aston Villa", "Premier League", "Feb 7, 2024", "16:00")
            .with_odds("1.45", "4.20", "6.50")
            .with_partners(LOGO_1, LOGO_2),
    ]
}
