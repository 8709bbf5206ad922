//! Heartbeat configuration for the tick loop
//!
//! The heartbeat determines how long the scheduler waits between ticks,
//! how often it checks whether the character has gone to bed, and how it
//! backs off after a failed decision.

use selena_core::config::SchedulerConfig;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

/// Configuration for the scheduler heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Wait used when the decision carries no duration (default: 5 min)
    pub default_tick: Duration,
    /// Shortest allowed wait between ticks
    pub min_tick: Duration,
    /// Longest allowed wait between ticks
    pub max_tick: Duration,
    /// How often the rest check runs while active (default: 15 min)
    pub rest_check_interval: Duration,
    /// Pause between waking up and the first active tick (default: 1 min)
    pub post_wake_delay: Duration,
    /// Retry delay after a failed or malformed decision
    pub retry_backoff: Duration,
    /// Bound on every external call
    pub call_timeout: Duration,
    /// Below this energy the character goes straight to sleep
    pub low_energy_threshold: f32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for HeartbeatConfig {
    fn from(cfg: &SchedulerConfig) -> Self {
        let min_tick = MINUTE * cfg.min_tick_minutes.max(1) as u32;
        let max_tick = (MINUTE * cfg.max_tick_minutes as u32).max(min_tick);
        Self {
            default_tick: (MINUTE * cfg.default_tick_minutes as u32).clamp(min_tick, max_tick),
            min_tick,
            max_tick,
            rest_check_interval: MINUTE * cfg.rest_check_minutes.max(1) as u32,
            post_wake_delay: MINUTE * cfg.post_wake_minutes as u32,
            retry_backoff: MINUTE * cfg.retry_backoff_minutes.max(1) as u32,
            call_timeout: cfg.call_timeout(),
            low_energy_threshold: cfg.low_energy_threshold,
        }
    }
}

impl HeartbeatConfig {
    /// Wait before the next tick for a decision that asked for `minutes`.
    pub fn tick_after(&self, minutes: Option<f64>) -> Duration {
        match minutes {
            Some(m) if m.is_finite() && m > 0.0 => {
                // Clamp before converting; huge values overflow `Duration`.
                let min = self.min_tick.as_secs_f64() / 60.0;
                let max = self.max_tick.as_secs_f64() / 60.0;
                Duration::from_secs_f64(m.clamp(min, max) * 60.0)
            }
            Some(m) => {
                tracing::warn!("Ignoring non-positive tick duration {}", m);
                self.default_tick
            }
            None => self.default_tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_scheduler_config() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.default_tick, Duration::from_secs(300));
        assert_eq!(hb.rest_check_interval, Duration::from_secs(900));
        assert_eq!(hb.post_wake_delay, Duration::from_secs(60));
        assert_eq!(hb.call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_tick_after_is_verbatim_in_range() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.tick_after(Some(30.0)), Duration::from_secs(1800));
    }

    #[test]
    fn test_tick_after_clamps() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.tick_after(Some(0.1)), Duration::from_secs(60));
        assert_eq!(hb.tick_after(Some(10_000.0)), Duration::from_secs(240 * 60));
    }

    #[test]
    fn test_tick_after_huge_duration_hits_max() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.tick_after(Some(1e20)), hb.max_tick);
        assert_eq!(hb.tick_after(Some(f64::MAX)), hb.max_tick);
        assert_eq!(hb.tick_after(Some(f64::INFINITY)), hb.default_tick);
    }

    #[test]
    fn test_tick_after_rejects_garbage() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.tick_after(Some(-5.0)), hb.default_tick);
        assert_eq!(hb.tick_after(Some(f64::NAN)), hb.default_tick);
        assert_eq!(hb.tick_after(None), hb.default_tick);
    }
}
