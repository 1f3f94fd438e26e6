//! Trailing time windows for device telemetry queries.
//!
//! Clients ask for metrics with a symbolic token (`15min`, `3hours`, `1day`, `7days`,
//! `30days`). The token resolves to a [`Timeframe`], and the lower bound of the window is
//! computed here and bound as a query parameter, so no interval text ever reaches SQL.
//! Unknown or missing tokens resolve to the 15 minute window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Timeframe {
    #[default]
    FifteenMinutes,
    ThreeHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::FifteenMinutes,
        Timeframe::ThreeHours,
        Timeframe::OneDay,
        Timeframe::SevenDays,
        Timeframe::ThirtyDays,
    ];

    /// Resolve a query token. Never fails: anything unrecognised is the 15 minute window.
    pub fn from_token(token: &str) -> Self {
        match token {
            "15min" => Timeframe::FifteenMinutes,
            "3hours" => Timeframe::ThreeHours,
            "1day" => Timeframe::OneDay,
            "7days" => Timeframe::SevenDays,
            "30days" => Timeframe::ThirtyDays,
            _ => Timeframe::FifteenMinutes,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Timeframe::FifteenMinutes => "15min",
            Timeframe::ThreeHours => "3hours",
            Timeframe::OneDay => "1day",
            Timeframe::SevenDays => "7days",
            Timeframe::ThirtyDays => "30days",
        }
    }

    pub fn window(&self) -> Duration {
        match self {
            Timeframe::FifteenMinutes => Duration::minutes(15),
            Timeframe::ThreeHours => Duration::hours(3),
            Timeframe::OneDay => Duration::days(1),
            Timeframe::SevenDays => Duration::days(7),
            Timeframe::ThirtyDays => Duration::days(30),
        }
    }

    /// Oldest `recorded_at` (inclusive) that falls inside the window ending at `now`.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window()
    }
}

impl From<String> for Timeframe {
    fn from(token: String) -> Self {
        Timeframe::from_token(&token)
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.token().to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
