//! Short-term memory: a rolling window of recent activity summaries.

use chrono::{DateTime, Duration, Utc};
use selena_core::ActivityType;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_MEMORY_CAPACITY: usize = 60;
/// How many of the latest entries feed the summary.
const SUMMARY_WINDOW: usize = 5;
const EMPTY_SUMMARY: &str = "No recent activities to summarize.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

impl MemoryEntry {
    pub fn new(timestamp: DateTime<Utc>, summary: impl Into<String>) -> Self {
        Self {
            timestamp,
            summary: summary.into(),
        }
    }
}

/// FIFO buffer; insertion order is chronological order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
    recent_window: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            recent_window: Duration::minutes(60),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn append(&mut self, entry: MemoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entries younger than 60 minutes at `now`. An entry exactly 60
    /// minutes old is excluded.
    pub fn recent(&self, now: DateTime<Utc>) -> Vec<MemoryEntry> {
        self.entries
            .iter()
            .filter(|e| now - e.timestamp < self.recent_window)
            .cloned()
            .collect()
    }

    /// One sentence per activity category among the last few entries,
    /// naming how long ago that category last happened.
    pub fn summarize(&self, now: DateTime<Utc>) -> String {
        if self.entries.is_empty() {
            return EMPTY_SUMMARY.to_string();
        }

        let skip = self.entries.len().saturating_sub(SUMMARY_WINDOW);
        // (category, latest entry in category), in first-seen order
        let mut groups: Vec<(&'static str, &MemoryEntry)> = Vec::new();
        for entry in self.entries.iter().skip(skip) {
            let category = ActivityType::from_keywords(&entry.summary)
                .map(ActivityType::as_str)
                .unwrap_or("other");
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some(slot) => slot.1 = entry,
                None => groups.push((category, entry)),
            }
        }

        let parts: Vec<String> = groups
            .into_iter()
            .map(|(category, last)| {
                let minutes_ago = (now - last.timestamp).num_minutes();
                format!(
                    "Recently {category} activities: Last {category} was {minutes_ago} minutes ago"
                )
            })
            .collect();

        format!("{}.", parts.join(". "))
    }
}
