//! Capped, append-only JSON-array logs.
//!
//! Each journal is a single JSON array on disk holding at most `capacity`
//! entries; the oldest are dropped first. Like the state file, a journal
//! assumes one writer process.

use crate::state_store::write_json_atomic;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use selena_core::{ActivityAnalysis, Weather};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// One tick as recorded in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub timestamp: DateTime<Utc>,
    pub weather: Weather,
    pub energy: f32,
    pub mood: f32,
    pub thoughts: Vec<String>,
    pub actions: Vec<String>,
    /// Minutes until the next tick.
    pub duration: u32,
}

/// One analyzer run as recorded in the analyzer log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerLogEntry {
    pub timestamp: DateTime<Utc>,
    pub activity: String,
    pub analysis: ActivityAnalysis,
    pub energy_change: f32,
    pub mood_change: f32,
    pub final_energy: f32,
    pub final_mood: f32,
}

pub type ActivityLog = Journal<ActivityLogEntry>;
pub type AnalyzerLog = Journal<AnalyzerLogEntry>;

pub struct Journal<T> {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
    _entry: PhantomData<fn() -> T>,
}

impl<T> Journal<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one entry, evicting the oldest beyond capacity.
    ///
    /// A corrupt file is replaced by a fresh journal. Read errors are
    /// returned and leave the file untouched.
    pub async fn append(&self, entry: T) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.read_raw().await? {
            None => Vec::new(),
            Some(content) => match self.parse(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Starting a fresh journal at {}: {:#}", self.path.display(), e);
                    Vec::new()
                }
            },
        };
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        write_json_atomic(&self.path, &entries).await
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<T>> {
        let _guard = self.write_lock.lock().await;
        match self.read_raw().await? {
            None => Ok(Vec::new()),
            Some(content) => self.parse(&content),
        }
    }

    pub async fn latest(&self) -> Result<Option<T>> {
        Ok(self.entries().await?.pop())
    }

    /// File contents, or `None` when there is no journal yet.
    async fn read_raw(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(c) if c.trim().is_empty() => Ok(None),
            Ok(c) => Ok(Some(c)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    fn parse(&self, content: &str) -> Result<Vec<T>> {
        serde_json::from_str(content)
            .with_context(|| format!("Corrupt journal {}", self.path.display()))
    }
}
