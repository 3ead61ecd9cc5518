use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kind tag carried in the wire field `eventType`.
///
/// Unrecognised tags are kept verbatim in [`EventKind::Other`] so they can be
/// stored and counted in totals, but no breakdown reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Pageview,
    Click,
    ScrollDepth,
    TimeOnPage,
    Performance,
    Error,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Pageview => "pageview",
            EventKind::Click => "click",
            EventKind::ScrollDepth => "scroll_depth",
            EventKind::TimeOnPage => "time_on_page",
            EventKind::Performance => "performance",
            EventKind::Error => "error",
            EventKind::Other(raw) => raw.as_str(),
        }
    }
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::Other("unknown".to_string())
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pageview" => EventKind::Pageview,
            "click" => EventKind::Click,
            "scroll_depth" => EventKind::ScrollDepth,
            "time_on_page" => EventKind::TimeOnPage,
            "performance" => EventKind::Performance,
            "error" => EventKind::Error,
            _ => EventKind::Other(raw),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Navigation timings reported by the tracker, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceTimings {
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub page_load_time: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub dns_lookup: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub tcp_connect: Option<f64>,
}

/// One client-reported event, exactly as the tracker sent it.
///
/// Every field is optional and validation is permissive: unknown fields are
/// ignored and a field with the wrong JSON type reads as absent rather than
/// failing the whole record. The timestamp is kept as the raw string and only
/// parsed when a report needs it, so malformed values survive storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    /// Assigned by the store on append.
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// RFC 3339 instant the store accepted the event.
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,

    #[serde(deserialize_with = "lenient::kind")]
    pub event_type: EventKind,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    // Page context
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    // Client environment
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<i64>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<i64>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub viewport_width: Option<i64>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<i64>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<i64>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub timezone_offset: Option<i64>,
    /// Filled in by the collect endpoint from `X-Forwarded-For`.
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    // scroll_depth / time_on_page
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub max_scroll_depth: Option<f64>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub time_on_page: Option<f64>,

    // performance
    #[serde(deserialize_with = "lenient::performance", skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceTimings>,

    // error
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub colno: Option<i64>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    // click
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub element_text: Option<String>,
    #[serde(deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Kind-specific view of an [`EventRecord`].
///
/// The report assembler dispatches on this once per event instead of
/// re-scanning the event set per dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload<'a> {
    Pageview,
    Click { label: &'a str },
    ScrollDepth { depth: Option<f64> },
    TimeOnPage { seconds: Option<f64> },
    Performance { timings: Option<&'a PerformanceTimings> },
    Error { message: &'a str },
    Other,
}

pub const UNKNOWN_CLICK_LABEL: &str = "Unknown";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

impl EventRecord {
    /// Parse a single JSON object sent by the tracker.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn payload(&self) -> EventPayload<'_> {
        match &self.event_type {
            EventKind::Pageview => EventPayload::Pageview,
            EventKind::Click => EventPayload::Click {
                label: self.click_label(),
            },
            EventKind::ScrollDepth => EventPayload::ScrollDepth {
                depth: self.max_scroll_depth,
            },
            EventKind::TimeOnPage => EventPayload::TimeOnPage {
                seconds: self.time_on_page,
            },
            EventKind::Performance => EventPayload::Performance {
                timings: self.performance.as_ref(),
            },
            EventKind::Error => EventPayload::Error {
                message: non_empty(self.message.as_deref()).unwrap_or(UNKNOWN_ERROR_MESSAGE),
            },
            EventKind::Other(_) => EventPayload::Other,
        }
    }

    /// First non-empty of `elementText`, `elementId`, `href`.
    pub fn click_label(&self) -> &str {
        non_empty(self.element_text.as_deref())
            .or_else(|| non_empty(self.element_id.as_deref()))
            .or_else(|| non_empty(self.href.as_deref()))
            .unwrap_or(UNKNOWN_CLICK_LABEL)
    }

    /// The event's own timestamp, or `None` if absent or unparseable.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Parse the timestamp formats trackers actually send.
///
/// Accepts RFC 3339 (with `Z` or an offset) and naive ISO-8601 date-times,
/// which are taken as UTC. A bare `YYYY-MM-DD` means midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Field deserializers that never fail: a value of the wrong shape is `None`.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{EventKind, PerformanceTimings};

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_f64(&Value::deserialize(deserializer)?))
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if let Some(i) = value.as_i64() {
            return Ok(Some(i));
        }
        if let Value::String(s) = &value {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Ok(Some(i));
            }
        }
        Ok(as_f64(&value).map(|f| f.trunc() as i64))
    }

    pub fn kind<'de, D>(deserializer: D) -> Result<EventKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.map(EventKind::from).unwrap_or_default())
    }

    pub fn performance<'de, D>(deserializer: D) -> Result<Option<PerformanceTimings>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
            _ => None,
        })
    }

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }
}
