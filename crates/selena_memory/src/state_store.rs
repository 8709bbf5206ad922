//! Persisted energy/mood record
//!
//! The store is the only owner of `AiState`. Storage failures never reach
//! the caller: reads fall back to the default state and failed writes are
//! logged while the new in-memory state is still returned.
//!
//! Assumes a single writer process per state file; there is no file locking.

use anyhow::{Context, Result};
use selena_core::{AiState, Clock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct StateStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    /// Last known state; also serializes every read-modify-write.
    current: Mutex<Option<AiState>>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            current: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state. On first use, reads the file or creates and persists
    /// the default record.
    pub async fn load(&self) -> AiState {
        let mut current = self.current.lock().await;
        self.load_locked(&mut current).await
    }

    /// Apply deltas (scaled by 0.1 and clamped to [0, 1]) and persist.
    pub async fn update(&self, energy_delta: f32, mood_delta: f32) -> AiState {
        let mut current = self.current.lock().await;
        let state = self.load_locked(&mut current).await;
        let next = state.apply(energy_delta, mood_delta, self.clock.now());
        tracing::debug!(
            "State update: energy {:.3} -> {:.3}, mood {:.3} -> {:.3}",
            state.energy,
            next.energy,
            state.mood,
            next.mood
        );
        self.commit(&mut current, next).await
    }

    /// Replace energy and mood outright (used when waking from rest).
    pub async fn overwrite(&self, energy: f32, mood: f32) -> AiState {
        let mut current = self.current.lock().await;
        let next = AiState::new(energy, mood, self.clock.now());
        self.commit(&mut current, next).await
    }

    async fn load_locked(&self, current: &mut Option<AiState>) -> AiState {
        if let Some(state) = current.as_ref() {
            return state.clone();
        }

        let state = match self.read().await {
            Ok(Some(mut state)) => {
                state.normalize();
                state
            }
            Ok(None) => {
                let state = AiState::initial(self.clock.now());
                tracing::info!("No persisted state at {}, creating default", self.path.display());
                if let Err(e) = self.save(&state).await {
                    tracing::error!("Failed to persist initial state: {:#}", e);
                }
                state
            }
            Err(e) => {
                tracing::error!("Failed to load state, using defaults: {:#}", e);
                AiState::initial(self.clock.now())
            }
        };
        *current = Some(state.clone());
        state
    }

    async fn commit(&self, current: &mut Option<AiState>, next: AiState) -> AiState {
        if let Err(e) = self.save(&next).await {
            tracing::error!("Failed to save state: {:#}", e);
        }
        *current = Some(next.clone());
        next
    }

    async fn read(&self) -> Result<Option<AiState>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let state = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt state file {}", self.path.display()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &AiState) -> Result<()> {
        write_json_atomic(&self.path, state).await
    }
}

/// Write pretty JSON to a sibling temp file, then rename over the target.
pub(crate) async fn write_json_atomic<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
