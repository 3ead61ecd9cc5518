use std::collections::{HashSet, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use glimpse_core::event::EventRecord;
use glimpse_core::store::StoreTotals;

/// Append-only JSON-lines event log with a bounded in-memory mirror.
///
/// Every accepted event is written as one line and kept in memory; only the
/// newest `max_events` survive in memory. When the file grows past twice
/// that, it is rewritten from the mirror.
pub struct FileEventLog {
    path: PathBuf,
    max_events: usize,
    state: Mutex<LogState>,
}

struct LogState {
    events: VecDeque<EventRecord>,
    lines_on_disk: usize,
}

impl FileEventLog {
    /// Open the log at `path`, loading the newest `max_events` records.
    ///
    /// A missing file is an empty log. Lines that are not UTF-8 or not valid
    /// JSON are skipped with a warning.
    pub fn open(path: impl AsRef<Path>, max_events: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let max_events = max_events.max(1);
        let mut events = VecDeque::new();
        let mut lines_on_disk = 0usize;

        match std::fs::File::open(&path) {
            Ok(file) => {
                for (lineno, line) in BufReader::new(file).split(b'\n').enumerate() {
                    let line = line.with_context(|| format!("reading {}", path.display()))?;
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    lines_on_disk += 1;
                    // Raw bytes: serde_json rejects invalid UTF-8 like any other bad input.
                    match EventRecord::from_json(&line) {
                        Ok(event) => {
                            if events.len() == max_events {
                                events.pop_front();
                            }
                            events.push_back(event);
                        }
                        Err(e) => warn!(
                            line = lineno + 1,
                            error = %e,
                            "Skipping corrupt event log line"
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
        }

        info!(
            "Event log opened at {} with {} events ({} lines on disk)",
            path.display(),
            events.len(),
            lines_on_disk
        );
        Ok(Self {
            path,
            max_events,
            state: Mutex::new(LogState {
                events,
                lines_on_disk,
            }),
        })
    }

    /// Assign an id and receive time, write the line, then mirror it in memory.
    pub async fn append_event(&self, mut event: EventRecord) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        event.id = Some(id.clone());
        event.received_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let line = event.to_json()?;

        let mut state = self.state.lock().await;
        {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("opening {}", self.path.display()))?;
            writeln!(file, "{line}")?;
        }
        state.lines_on_disk += 1;

        if state.events.len() == self.max_events {
            state.events.pop_front();
        }
        state.events.push_back(event);

        // The event is durable at this point; a failed rewrite is retried on
        // the next append since the line count stays over the threshold.
        if state.lines_on_disk > self.max_events * 2 {
            if let Err(e) = self.compact(&mut state) {
                warn!(error = %e, path = %self.path.display(), "Event log compaction failed");
            }
        }

        debug!(event_id = %id, "Event appended to log");
        Ok(id)
    }

    /// Rewrite the file to hold only the in-memory events.
    fn compact(&self, state: &mut LogState) -> Result<()> {
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut out = std::io::BufWriter::new(
                std::fs::File::create(&tmp)
                    .with_context(|| format!("creating {}", tmp.display()))?,
            );
            for event in &state.events {
                serde_json::to_writer(&mut out, event)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        info!(
            "Compacted event log from {} to {} lines",
            state.lines_on_disk,
            state.events.len()
        );
        state.lines_on_disk = state.events.len();
        Ok(())
    }

    /// In-memory events at or after `cutoff`, optionally for one hostname.
    /// With no cutoff, events with unparseable timestamps are included.
    pub async fn query_events(
        &self,
        cutoff: Option<DateTime<Utc>>,
        hostname: Option<&str>,
    ) -> Vec<EventRecord> {
        let state = self.state.lock().await;
        state
            .events
            .iter()
            .filter(|event| match cutoff {
                Some(cutoff) => event.parsed_timestamp().is_some_and(|at| at >= cutoff),
                None => true,
            })
            .filter(|event| hostname.map_or(true, |h| event.hostname.as_deref() == Some(h)))
            .cloned()
            .collect()
    }

    pub async fn totals(&self) -> StoreTotals {
        let state = self.state.lock().await;
        let mut visitors = HashSet::new();
        let mut sessions = HashSet::new();
        for event in &state.events {
            if let Some(v) = event.visitor_id.as_deref().filter(|v| !v.is_empty()) {
                visitors.insert(v);
            }
            if let Some(s) = event.session_id.as_deref().filter(|s| !s.is_empty()) {
                sessions.insert(s);
            }
        }
        StoreTotals {
            total_events: state.events.len() as u64,
            total_visitors: visitors.len() as u64,
            total_sessions: sessions.len() as u64,
        }
    }

    /// The log is usable as long as its directory exists.
    pub async fn ping(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let meta = std::fs::metadata(dir).with_context(|| format!("stat {}", dir.display()))?;
        anyhow::ensure!(meta.is_dir(), "{} is not a directory", dir.display());
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn lines_on_disk(&self) -> usize {
        self.state.lock().await.lines_on_disk
    }
}
