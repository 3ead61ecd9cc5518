use std::sync::Arc;

use chrono::{Duration, SecondsFormat, Utc};
use glimpse_core::event::{EventKind, EventRecord};
use glimpse_core::store::EventStore;
use glimpse_store::DuckDbStore;

fn event_at(kind: EventKind, timestamp: &str, hostname: &str, visitor: &str) -> EventRecord {
    EventRecord {
        event_type: kind,
        visitor_id: Some(visitor.to_string()),
        session_id: Some(format!("s-{visitor}")),
        timestamp: Some(timestamp.to_string()),
        hostname: Some(hostname.to_string()),
        path: Some("/".to_string()),
        ..Default::default()
    }
}

fn ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[tokio::test]
async fn append_assigns_id_and_receive_time() {
    let db = DuckDbStore::open_in_memory().expect("open");
    let id = db
        .append(event_at(EventKind::Pageview, &ago(1), "a.com", "v1"))
        .await
        .expect("append");
    assert!(!id.is_empty());

    let events = db.query(None, None).await.expect("query");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id.as_deref(), Some(id.as_str()));
    assert!(events[0].received_at.is_some());
}

#[tokio::test]
async fn cutoff_and_hostname_are_pushed_down() {
    let db = DuckDbStore::open_in_memory().expect("open");
    db.append(event_at(EventKind::Pageview, &ago(1), "a.com", "v1"))
        .await
        .expect("append");
    db.append(event_at(EventKind::Pageview, &ago(48), "a.com", "v2"))
        .await
        .expect("append");
    db.append(event_at(EventKind::Click, &ago(2), "b.com", "v3"))
        .await
        .expect("append");

    let cutoff = Utc::now() - Duration::hours(24);
    let recent = db.query(Some(cutoff), None).await.expect("query");
    assert_eq!(recent.len(), 2);

    let recent_a = db.query(Some(cutoff), Some("a.com")).await.expect("query");
    assert_eq!(recent_a.len(), 1);
    assert_eq!(recent_a[0].visitor_id.as_deref(), Some("v1"));

    let all_a = db.query(None, Some("a.com")).await.expect("query");
    assert_eq!(all_a.len(), 2);
}

#[tokio::test]
async fn malformed_timestamp_is_kept_but_never_in_range() {
    let db = DuckDbStore::open_in_memory().expect("open");
    db.append(event_at(EventKind::Pageview, "not-a-date", "a.com", "v1"))
        .await
        .expect("append");

    let all = db.query(None, None).await.expect("query");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].timestamp.as_deref(), Some("not-a-date"));

    let cutoff = Utc::now() - Duration::days(30);
    assert!(db.query(Some(cutoff), None).await.expect("query").is_empty());
}

#[tokio::test]
async fn payload_round_trips_type_specific_fields() {
    let db = DuckDbStore::open_in_memory().expect("open");
    let mut event = event_at(EventKind::Error, &ago(1), "a.com", "v1");
    event.message = Some("TypeError: x is undefined".to_string());
    event.line = Some(12);
    db.append(event).await.expect("append");

    let stored = db.query(None, None).await.expect("query");
    assert_eq!(stored[0].event_type, EventKind::Error);
    assert_eq!(stored[0].message.as_deref(), Some("TypeError: x is undefined"));
    assert_eq!(stored[0].line, Some(12));
}

#[tokio::test]
async fn totals_count_distinct_non_empty_ids() {
    let db = DuckDbStore::open_in_memory().expect("open");
    for visitor in ["v1", "v1", "v2"] {
        db.append(event_at(EventKind::Pageview, &ago(1), "a.com", visitor))
            .await
            .expect("append");
    }
    db.append(EventRecord {
        visitor_id: Some(String::new()),
        ..Default::default()
    })
    .await
    .expect("append");

    let totals = db.totals().await.expect("totals");
    assert_eq!(totals.total_events, 4);
    assert_eq!(totals.total_visitors, 2);
    assert_eq!(totals.total_sessions, 2);
}

#[tokio::test]
async fn rows_are_indexed_by_event_type() {
    let db = DuckDbStore::open_in_memory().expect("open");
    db.append(event_at(EventKind::Click, &ago(1), "a.com", "v1"))
        .await
        .expect("append");
    db.append(event_at(EventKind::Other("custom".into()), &ago(1), "a.com", "v1"))
        .await
        .expect("append");

    let conn = db.conn_for_test().await;
    let kinds: Vec<String> = conn
        .prepare("SELECT event_type FROM events ORDER BY event_type")
        .expect("prepare")
        .query_map([], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    assert_eq!(kinds, vec!["click".to_string(), "custom".to_string()]);
}

#[tokio::test]
async fn ping_succeeds_on_open_store() {
    let db = DuckDbStore::open_in_memory().expect("open");
    EventStore::ping(&db).await.expect("ping");
}

#[tokio::test]
async fn query_runs_on_spawned_task_through_shared_store() {
    let store: Arc<dyn EventStore> = Arc::new(DuckDbStore::open_in_memory().expect("open"));
    store
        .append(event_at(EventKind::Pageview, &ago(1), "a.com", "v1"))
        .await
        .expect("append");
    store
        .append(event_at(EventKind::Pageview, &ago(1), "b.com", "v2"))
        .await
        .expect("append");

    let shared = Arc::clone(&store);
    let cutoff = Utc::now() - Duration::hours(24);
    let events = tokio::spawn(async move { shared.query(Some(cutoff), Some("a.com")).await })
        .await
        .expect("join")
        .expect("query");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].visitor_id.as_deref(), Some("v1"));
}
