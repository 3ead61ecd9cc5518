//! Group-count-rank primitive shared by every breakdown in the report.

use std::collections::HashMap;

/// One group of a breakdown: the group key and how many items fell into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub label: String,
    pub count: u64,
}

/// Counter that remembers the order in which groups were first seen.
///
/// Ranking sorts by count descending with a stable sort, so equal counts
/// come out in first-seen order.
#[derive(Debug, Default)]
pub struct RankCounter {
    index: HashMap<String, usize>,
    groups: Vec<Ranked>,
}

impl RankCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.groups[slot].count += 1,
            None => {
                self.index.insert(label.to_string(), self.groups.len());
                self.groups.push(Ranked {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Count `label`, substituting `default_label` when it is absent or empty.
    pub fn add_or(&mut self, label: Option<&str>, default_label: &str) {
        self.add(label.filter(|l| !l.is_empty()).unwrap_or(default_label));
    }

    /// Groups sorted by count descending; `None` returns every group.
    pub fn top(self, limit: Option<usize>) -> Vec<Ranked> {
        let mut groups = self.groups;
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(limit) = limit {
            groups.truncate(limit);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank<'a>(
        items: impl IntoIterator<Item = Option<&'a str>>,
        default_label: &str,
        limit: Option<usize>,
    ) -> Vec<Ranked> {
        let mut counter = RankCounter::new();
        for item in items {
            counter.add_or(item, default_label);
        }
        counter.top(limit)
    }

    fn labels(ranked: &[Ranked]) -> Vec<(&str, u64)> {
        ranked.iter().map(|r| (r.label.as_str(), r.count)).collect()
    }

    #[test]
    fn ranks_by_count_descending() {
        let ranked = rank(["a", "b", "b", "c", "b", "c"].map(Some), "?", None);
        assert_eq!(labels(&ranked), vec![("b", 3), ("c", 2), ("a", 1)]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let ranked = rank(["z", "y", "x", "y", "z", "x"].map(Some), "?", None);
        assert_eq!(labels(&ranked), vec![("z", 2), ("y", 2), ("x", 2)]);
    }

    #[test]
    fn absent_and_empty_keys_use_default_label() {
        let items = [Some("/a"), None, Some(""), Some("/a")];
        let ranked = rank(items, "/", None);
        assert_eq!(labels(&ranked), vec![("/a", 2), ("/", 2)]);
    }

    #[test]
    fn limit_caps_output() {
        let items: Vec<String> = (0..25).map(|i| format!("p{i}")).collect();
        let ranked = rank(items.iter().map(|s| Some(s.as_str())), "?", Some(10));
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].label, "p0");
        assert_eq!(ranked[9].label, "p9");
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        assert!(RankCounter::new().top(Some(5)).is_empty());
        assert!(rank([], "?", None).is_empty());
    }
}
