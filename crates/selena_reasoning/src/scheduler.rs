//! Tick scheduler
//!
//! Owns the character loop: when the next tick fires, when the periodic
//! rest check runs, and the `Active <-> Resting` cycle. One driver task per
//! running scheduler holds at most one pending wake-up at a time.
//!
//! Every `start` bumps a generation number. Work started under an older
//! generation never commits, so a `stop` racing an in-flight tick leaves
//! state and logs untouched.

use crate::engine::{whole_minutes, TickEngine, TickOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use selena_core::{should_consider_rest, LoopControl, LoopStatus, Phase};
use selena_limbic::{mentions_rest, RestEpisode, RestStateMachine};
use selena_memory::ActivityLogEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

// ============================================================================
// Timer slot
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WakeKind {
    Tick,
    Resume,
}

#[derive(Debug, Clone, Copy)]
struct Wake {
    at: Instant,
    kind: WakeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Tick,
    Resume,
    RestCheck,
}

#[derive(Debug, Default)]
struct Timers {
    next: Option<Wake>,
    /// Paused while resting.
    rest_check_at: Option<Instant>,
    rest: RestStateMachine,
}

impl Timers {
    fn clear(&mut self) {
        self.next = None;
        self.rest_check_at = None;
        self.rest.reset();
    }

    fn next_due(&self) -> Option<(Instant, Due)> {
        let wake = self.next.map(|w| {
            let due = match w.kind {
                WakeKind::Tick => Due::Tick,
                WakeKind::Resume => Due::Resume,
            };
            (w.at, due)
        });
        let check = self.rest_check_at.map(|at| (at, Due::RestCheck));
        match (wake, check) {
            (Some(w), Some(c)) => Some(if w.0 <= c.0 { w } else { c }),
            (w, c) => w.or(c),
        }
    }
}

struct Shared {
    running: AtomicBool,
    generation: watch::Sender<u64>,
    timers: Mutex<Timers>,
}

impl Shared {
    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && *self.generation.borrow() == generation
    }
}

// ============================================================================
// TickScheduler
// ============================================================================

pub struct TickScheduler {
    engine: Arc<TickEngine>,
    shared: Arc<Shared>,
}

impl TickScheduler {
    pub fn new(engine: Arc<TickEngine>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            engine,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                generation,
                timers: Mutex::new(Timers::default()),
            }),
        }
    }

    pub fn engine(&self) -> &Arc<TickEngine> {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.shared.timers().rest.phase()
    }

    pub fn rest_episode(&self) -> Option<RestEpisode> {
        self.shared.timers().rest.episode().cloned()
    }

    /// Time until the pending tick or wake-up, if any.
    pub fn time_remaining(&self) -> Option<Duration> {
        let next = self.shared.timers().next?;
        Some(next.at.saturating_duration_since(Instant::now()))
    }
}

#[async_trait]
impl LoopControl for TickScheduler {
    async fn start(&self) -> bool {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        let mut generation = 0;
        self.shared.generation.send_modify(|g| {
            *g += 1;
            generation = *g;
        });
        {
            let now = Instant::now();
            let mut timers = self.shared.timers();
            timers.clear();
            timers.next = Some(Wake {
                at: now,
                kind: WakeKind::Tick,
            });
            timers.rest_check_at = Some(now + self.engine.heartbeat().rest_check_interval);
        }

        let driver = Driver {
            engine: self.engine.clone(),
            shared: self.shared.clone(),
            generation,
            started_at: self.engine.clock().now(),
        };
        tokio::spawn(driver.run());
        tracing::info!("Character loop started (generation {})", generation);
        true
    }

    async fn stop(&self) -> bool {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.shared.generation.send_modify(|g| *g += 1);
        self.shared.timers().clear();
        tracing::info!("Character loop stopped");
        true
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    async fn status(&self) -> LoopStatus {
        let state = self.engine.state().load().await;
        LoopStatus {
            running: self.is_running(),
            phase: self.phase(),
            next_wake_secs: self.time_remaining().map(|d| d.as_secs()),
            energy: state.energy,
            mood: state.mood,
        }
    }
}

// ============================================================================
// Driver task
// ============================================================================

struct Driver {
    engine: Arc<TickEngine>,
    shared: Arc<Shared>,
    generation: u64,
    /// Log entries older than this belong to an earlier run.
    started_at: DateTime<Utc>,
}

impl Driver {
    async fn run(self) {
        let mut changes = self.shared.generation.subscribe();
        loop {
            if !self.current() {
                break;
            }
            let due = self.shared.timers().next_due();
            let Some((at, due)) = due else {
                if changes.changed().await.is_err() {
                    break;
                }
                continue;
            };

            tokio::select! {
                _ = tokio::time::sleep_until(at) => {}
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }
            if !self.current() {
                break;
            }

            match due {
                Due::Tick => self.tick().await,
                Due::Resume => self.resume().await,
                Due::RestCheck => self.rest_check().await,
            }
        }
        tracing::debug!("Driver for generation {} exited", self.generation);
    }

    fn current(&self) -> bool {
        self.shared.is_current(self.generation)
    }

    /// Install the single pending wake-up, replacing any earlier one.
    fn arm(&self, kind: WakeKind, after: Duration) {
        let mut timers = self.shared.timers();
        if !self.current() {
            return;
        }
        timers.next = Some(Wake {
            at: Instant::now() + after,
            kind,
        });
        tracing::debug!("Next {:?} in {:?}", kind, after);
    }

    async fn tick(&self) {
        {
            let mut timers = self.shared.timers();
            if !self.current() {
                return;
            }
            timers.next = None;
        }

        let shared = self.shared.clone();
        let generation = self.generation;
        let still_current = move || shared.is_current(generation);
        let outcome = self.engine.run_tick(&still_current).await;

        let heartbeat = self.engine.heartbeat();
        match outcome {
            TickOutcome::Completed { next_tick, .. } => self.arm(WakeKind::Tick, next_tick),
            TickOutcome::Skipped { .. } => self.arm(WakeKind::Tick, heartbeat.retry_backoff),
            TickOutcome::Exhausted { entry } => {
                if !self.consider_rest(&entry) {
                    self.arm(WakeKind::Tick, heartbeat.retry_backoff);
                }
            }
            TickOutcome::Superseded => {}
        }
    }

    async fn rest_check(&self) {
        {
            let mut timers = self.shared.timers();
            if !self.current() {
                return;
            }
            timers.rest_check_at =
                Some(Instant::now() + self.engine.heartbeat().rest_check_interval);
        }
        let Some(entry) = self.engine.latest_activity().await else {
            return;
        };
        if entry.timestamp < self.started_at {
            tracing::debug!("Rest check: latest entry predates this run, ignoring");
            return;
        }
        if self.current() {
            self.consider_rest(&entry);
        }
    }

    /// Enter Resting if the entry's actions mention rest, or its thoughts
    /// do while energy is low. Returns whether a rest episode began.
    fn consider_rest(&self, entry: &ActivityLogEntry) -> bool {
        let bucket = self.engine.clock().bucket();
        let wants_rest = mentions_rest(&entry.actions)
            || should_consider_rest(entry.energy, bucket, &entry.thoughts);
        if !wants_rest {
            return false;
        }

        let mut timers = self.shared.timers();
        if !self.current() {
            return false;
        }
        let now = self.engine.clock().now();
        let Some(episode) = timers.rest.begin_rest(bucket, entry.energy, now) else {
            return false;
        };
        let duration = episode.plan.duration;
        timers.next = Some(Wake {
            at: Instant::now() + duration,
            kind: WakeKind::Resume,
        });
        timers.rest_check_at = None;
        true
    }

    async fn resume(&self) {
        let clock = self.engine.clock();
        let wake = {
            let mut timers = self.shared.timers();
            if !self.current() {
                return;
            }
            timers.next = None;
            timers.rest.wake(clock.bucket(), clock.now())
        };
        let Some(wake) = wake else {
            tracing::warn!("Resume fired while not resting");
            return;
        };

        let weather = self.engine.current_weather().await;
        if !self.current() {
            return;
        }
        let state = self.engine.state().overwrite(wake.energy, wake.mood).await;
        let heartbeat = self.engine.heartbeat();
        self.engine
            .log_activity(ActivityLogEntry {
                timestamp: wake.woke_at,
                weather,
                energy: state.energy,
                mood: state.mood,
                thoughts: vec![wake.narration.thoughts],
                actions: vec![wake.narration.actions],
                duration: whole_minutes(heartbeat.post_wake_delay),
            })
            .await;

        self.arm(WakeKind::Tick, heartbeat.post_wake_delay);
        let mut timers = self.shared.timers();
        if self.current() {
            timers.rest_check_at = Some(Instant::now() + heartbeat.rest_check_interval);
        }
    }
}
