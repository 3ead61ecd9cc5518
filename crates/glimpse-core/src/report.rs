//! Report assembly: filter the event set for a range, then derive every
//! summary and breakdown in one pass.
//!
//! [`build_report`] is a pure function of its inputs. It never mutates the
//! events it is given and keeps no state between calls, so concurrent
//! callers need no coordination.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregate::{MeanAccumulator, PerformanceAccumulator};
use crate::event::{non_empty, EventPayload, EventRecord};
use crate::range::RangeToken;
use crate::rank::{RankCounter, Ranked};
use crate::referrer::normalize_referrer;

pub use crate::aggregate::PerformanceAverages;

pub const TOP_PAGES_LIMIT: usize = 10;
pub const TOP_REFERRERS_LIMIT: usize = 10;
pub const TOP_TIMEZONES_LIMIT: usize = 10;
pub const TOP_CLICKS_LIMIT: usize = 10;
pub const TOP_ERRORS_LIMIT: usize = 5;
pub const RECENT_EVENTS_LIMIT: usize = 20;

pub const CLICK_LABEL_MAX_CHARS: usize = 50;
pub const ERROR_MESSAGE_MAX_CHARS: usize = 100;
pub const VISITOR_ID_PREVIEW_CHARS: usize = 10;

pub const DEFAULT_PATH: &str = "/";
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_pageviews: u64,
    pub unique_visitors: u64,
    pub unique_sessions: u64,
    pub total_events: u64,
    pub avg_time_on_page: i64,
    pub avg_scroll_depth: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRow {
    pub page: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrerRow {
    pub referrer: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserRow {
    pub browser: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsRow {
    pub os: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRow {
    pub device: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneRow {
    pub timezone: String,
    pub count: u64,
}

/// Pageviews for one UTC calendar day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyViews {
    pub date: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickRow {
    pub element: String,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRow {
    pub message: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub path: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub visitor_id: String,
    pub browser: Option<String>,
    pub device: Option<String>,
}

/// Everything the dashboard shows for one range. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: RangeToken,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub top_pages: Vec<PageRow>,
    pub top_referrers: Vec<ReferrerRow>,
    pub browsers: Vec<BrowserRow>,
    pub operating_systems: Vec<OsRow>,
    pub devices: Vec<DeviceRow>,
    pub timezones: Vec<TimezoneRow>,
    pub views_over_time: Vec<DailyViews>,
    pub top_clicks: Vec<ClickRow>,
    pub top_errors: Vec<ErrorRow>,
    pub avg_performance: Option<PerformanceAverages>,
    pub recent_events: Vec<RecentEvent>,
}

/// Range and hostname predicate applied before any aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter<'a> {
    pub cutoff: Option<DateTime<Utc>>,
    pub hostname: Option<&'a str>,
}

/// An event that passed the filter, with its timestamp already parsed.
#[derive(Debug, Clone, Copy)]
pub struct FilteredEvent<'e> {
    pub at: DateTime<Utc>,
    pub event: &'e EventRecord,
}

impl<'a> EventFilter<'a> {
    pub fn new(cutoff: Option<DateTime<Utc>>, hostname: Option<&'a str>) -> Self {
        Self { cutoff, hostname }
    }

    /// Parsed timestamp if `event` qualifies, `None` if it is excluded.
    ///
    /// Events whose timestamp is missing or unparseable never qualify, even
    /// without a cutoff. Hostname matching is exact and case-sensitive.
    pub fn admit(&self, event: &EventRecord) -> Option<DateTime<Utc>> {
        let at = event.parsed_timestamp()?;
        if self.cutoff.is_some_and(|cutoff| at < cutoff) {
            return None;
        }
        if let Some(hostname) = self.hostname {
            if event.hostname.as_deref() != Some(hostname) {
                return None;
            }
        }
        Some(at)
    }

    pub fn apply<'e>(&self, events: &'e [EventRecord]) -> Vec<FilteredEvent<'e>> {
        events
            .iter()
            .filter_map(|event| self.admit(event).map(|at| FilteredEvent { at, event }))
            .collect()
    }
}

/// Compute the report for `events` restricted to `range` (relative to `now`)
/// and, when given, a single `hostname`.
pub fn build_report(
    events: &[EventRecord],
    range: RangeToken,
    hostname: Option<&str>,
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let filtered = EventFilter::new(range.cutoff(now), hostname).apply(events);

    let mut tally = Tally::default();
    for item in &filtered {
        tally.observe(item);
    }

    AnalyticsReport {
        range,
        generated_at: now,
        summary: Summary {
            total_pageviews: tally.pageviews,
            unique_visitors: tally.visitors.len() as u64,
            unique_sessions: tally.sessions.len() as u64,
            total_events: filtered.len() as u64,
            avg_time_on_page: tally.time_on_page.rounded_or_zero(),
            avg_scroll_depth: tally.scroll_depth.rounded_or_zero(),
        },
        top_pages: rows(tally.pages, Some(TOP_PAGES_LIMIT), |r| PageRow {
            page: r.label,
            views: r.count,
        }),
        top_referrers: rows(tally.referrers, Some(TOP_REFERRERS_LIMIT), |r| ReferrerRow {
            referrer: r.label,
            count: r.count,
        }),
        browsers: rows(tally.browsers, None, |r| BrowserRow {
            browser: r.label,
            count: r.count,
        }),
        operating_systems: rows(tally.operating_systems, None, |r| OsRow {
            os: r.label,
            count: r.count,
        }),
        devices: rows(tally.devices, None, |r| DeviceRow {
            device: r.label,
            count: r.count,
        }),
        timezones: rows(tally.timezones, Some(TOP_TIMEZONES_LIMIT), |r| TimezoneRow {
            timezone: r.label,
            count: r.count,
        }),
        views_over_time: tally
            .daily_views
            .into_iter()
            .map(|(date, views)| DailyViews {
                date: date.format("%Y-%m-%d").to_string(),
                views,
            })
            .collect(),
        top_clicks: rows(tally.clicks, Some(TOP_CLICKS_LIMIT), |r| ClickRow {
            element: truncate_chars(&r.label, CLICK_LABEL_MAX_CHARS),
            clicks: r.count,
        }),
        top_errors: rows(tally.errors, Some(TOP_ERRORS_LIMIT), |r| ErrorRow {
            message: truncate_chars(&r.label, ERROR_MESSAGE_MAX_CHARS),
            count: r.count,
        }),
        avg_performance: tally.performance.finish(),
        recent_events: recent_events(&filtered),
    }
}

/// Per-report working state, filled by a single pass over the filtered set.
#[derive(Default)]
struct Tally<'e> {
    pageviews: u64,
    visitors: HashSet<&'e str>,
    sessions: HashSet<&'e str>,
    pages: RankCounter,
    referrers: RankCounter,
    browsers: RankCounter,
    operating_systems: RankCounter,
    devices: RankCounter,
    timezones: RankCounter,
    daily_views: BTreeMap<NaiveDate, u64>,
    clicks: RankCounter,
    errors: RankCounter,
    time_on_page: MeanAccumulator,
    scroll_depth: MeanAccumulator,
    performance: PerformanceAccumulator,
}

impl<'e> Tally<'e> {
    fn observe(&mut self, item: &FilteredEvent<'e>) {
        let event = item.event;
        if let Some(visitor) = non_empty(event.visitor_id.as_deref()) {
            self.visitors.insert(visitor);
        }
        if let Some(session) = non_empty(event.session_id.as_deref()) {
            self.sessions.insert(session);
        }

        match event.payload() {
            EventPayload::Pageview => {
                self.pageviews += 1;
                self.pages.add_or(event.path.as_deref(), DEFAULT_PATH);
                self.referrers
                    .add(&normalize_referrer(event.referrer.as_deref()));
                self.browsers.add_or(event.browser.as_deref(), UNKNOWN_LABEL);
                self.operating_systems
                    .add_or(event.os.as_deref(), UNKNOWN_LABEL);
                self.devices
                    .add_or(event.device_type.as_deref(), UNKNOWN_LABEL);
                self.timezones
                    .add_or(event.timezone.as_deref(), UNKNOWN_LABEL);
                *self.daily_views.entry(item.at.date_naive()).or_insert(0) += 1;
            }
            // Grouped on the full label; truncation happens on output only.
            EventPayload::Click { label } => self.clicks.add(label),
            EventPayload::Error { message } => self.errors.add(message),
            EventPayload::ScrollDepth { depth } => self.scroll_depth.push_opt(depth),
            EventPayload::TimeOnPage { seconds } => self.time_on_page.push_opt(seconds),
            EventPayload::Performance { timings } => {
                if let Some(timings) = timings {
                    self.performance.push(timings);
                }
            }
            EventPayload::Other => {}
        }
    }
}

fn rows<R>(counter: RankCounter, limit: Option<usize>, to_row: impl FnMut(Ranked) -> R) -> Vec<R> {
    counter.top(limit).into_iter().map(to_row).collect()
}

fn recent_events(filtered: &[FilteredEvent<'_>]) -> Vec<RecentEvent> {
    let mut newest: Vec<&FilteredEvent<'_>> = filtered.iter().collect();
    newest.sort_by(|a, b| b.at.cmp(&a.at));
    newest
        .into_iter()
        .take(RECENT_EVENTS_LIMIT)
        .map(|item| {
            let event = item.event;
            RecentEvent {
                event_type: event.event_type.as_str().to_string(),
                path: event.path.clone(),
                timestamp: item.at,
                visitor_id: event
                    .visitor_id
                    .as_deref()
                    .map(|v| truncate_chars(v, VISITOR_ID_PREVIEW_CHARS))
                    .unwrap_or_default(),
                browser: event.browser.clone(),
                device: event.device_type.clone(),
            }
        })
        .collect()
}

/// First `max` characters of `s` (not bytes, so multi-byte text is safe).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
