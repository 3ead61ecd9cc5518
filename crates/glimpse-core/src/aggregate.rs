use serde::Serialize;

use crate::event::PerformanceTimings;

/// Round to the nearest integer, halves going up (`2.5 → 3`, `-2.5 → -2`).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Running sum/count for one numeric metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: u64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn push_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.push(v);
        }
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Rounded mean, or `0` when nothing was pushed.
    pub fn rounded_or_zero(&self) -> i64 {
        self.mean().map(round_half_up).unwrap_or(0)
    }
}

/// Averaged navigation timings, in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAverages {
    pub page_load_time: i64,
    pub dom_content_loaded: i64,
    pub first_byte: i64,
}

/// Accumulates performance payloads; each timing is averaged over the
/// payloads that actually carry it. A payload with none of the three
/// timings does not count.
#[derive(Debug, Default)]
pub struct PerformanceAccumulator {
    payloads: u64,
    page_load_time: MeanAccumulator,
    dom_content_loaded: MeanAccumulator,
    first_byte: MeanAccumulator,
}

impl PerformanceAccumulator {
    pub fn push(&mut self, timings: &PerformanceTimings) {
        if timings.page_load_time.is_none()
            && timings.dom_content_loaded.is_none()
            && timings.first_byte.is_none()
        {
            return;
        }
        self.payloads += 1;
        self.page_load_time.push_opt(timings.page_load_time);
        self.dom_content_loaded.push_opt(timings.dom_content_loaded);
        self.first_byte.push_opt(timings.first_byte);
    }

    /// `None` until at least one payload has been pushed.
    pub fn finish(&self) -> Option<PerformanceAverages> {
        if self.payloads == 0 {
            return None;
        }
        Some(PerformanceAverages {
            page_load_time: self.page_load_time.rounded_or_zero(),
            dom_content_loaded: self.dom_content_loaded.rounded_or_zero(),
            first_byte: self.first_byte.rounded_or_zero(),
        })
    }
}
