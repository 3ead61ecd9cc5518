use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Symbolic reporting window selected by the `range` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RangeToken {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

impl RangeToken {
    /// Resolve a raw token. Missing or unrecognised values mean `7d`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("24h") => Self::Last24Hours,
            Some("7d") => Self::Last7Days,
            Some("30d") => Self::Last30Days,
            Some("all") => Self::All,
            _ => Self::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::All => "all",
        }
    }

    pub fn window(self) -> Option<Duration> {
        match self {
            Self::Last24Hours => Some(Duration::hours(24)),
            Self::Last7Days => Some(Duration::days(7)),
            Self::Last30Days => Some(Duration::days(30)),
            Self::All => None,
        }
    }

    /// Earliest qualifying instant relative to `now`; `None` means unbounded.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }
}
