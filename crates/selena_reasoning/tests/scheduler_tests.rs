//! Scheduler scenarios on a paused tokio clock.
//!
//! The manual character clock is advanced alongside tokio time wherever the
//! time-of-day bucket matters.

mod common;

use common::*;
use selena_core::{ActivityAnalysis, LoopControl, Phase, Weather};
use selena_memory::ActivityLogEntry;
use selena_reasoning::providers::MockProvider;
use selena_reasoning::TickScheduler;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

async fn log_len(s: &TickScheduler) -> usize {
    s.engine().activity_log().entries().await.unwrap().len()
}

#[tokio::test(start_paused = true)]
async fn test_start_and_stop_are_idempotent() {
    let f = fixture(at(14, 0), MockProvider::new(), MockProvider::new());
    let scheduler = &TickScheduler::new(f.engine.clone());

    assert!(!scheduler.stop().await);
    assert!(scheduler.start().await);
    assert!(!scheduler.start().await);
    assert!(scheduler.is_running());

    assert!(scheduler.stop().await);
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.time_remaining(), None);
    assert!(!scheduler.stop().await);
}

#[tokio::test(start_paused = true)]
async fn test_night_rest_restores_energy() {
    let f = fixture(
        at(22, 30),
        MockProvider::new()
            .reply(r#"{"thoughts": "So sleepy", "actions": "going to bed", "duration": 30}"#),
        MockProvider::new().reply(REST_ANALYSIS),
    );
    f.engine.state().overwrite(0.15, 0.5).await;
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("first tick logged", || async move { log_len(scheduler).await == 1 }).await;
    eventually("next tick armed", || async move {
        scheduler.time_remaining() == Some(30 * MINUTE)
    })
    .await;
    assert_eq!(scheduler.phase(), Phase::Active);

    // The periodic rest check sees "going to bed"
    f.clock.advance(chrono::Duration::minutes(15));
    tokio::time::advance(15 * MINUTE).await;
    eventually("entered rest", || async move { scheduler.phase() == Phase::Resting }).await;

    let episode = scheduler.rest_episode().unwrap();
    assert_eq!(episode.plan.duration, 480 * MINUTE);
    assert_eq!(episode.recovered_energy, 1.0);
    assert_eq!(scheduler.time_remaining(), Some(480 * MINUTE));
    let status = scheduler.status().await;
    assert_eq!(status.phase, Phase::Resting);
    assert_eq!(status.next_wake_secs, Some(480 * 60));

    // Wake up in the morning
    f.clock.advance(chrono::Duration::minutes(480));
    tokio::time::advance(480 * MINUTE).await;
    eventually("woke up", || async move { scheduler.phase() == Phase::Active }).await;
    eventually("wake-up logged", || async move { log_len(scheduler).await == 2 }).await;

    let state = f.engine.state().load().await;
    assert_eq!(state.energy, 1.0);
    assert_eq!(state.mood, 0.8);

    let wake = f.engine.activity_log().latest().await.unwrap().unwrap();
    assert!(wake.thoughts[0].contains("slept through the night"));
    assert_eq!(wake.energy, 1.0);
    eventually("post-wake tick armed", || async move {
        scheduler.time_remaining() == Some(MINUTE)
    })
    .await;

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_analyzer_failure_still_schedules_next_tick() {
    let f = fixture(
        at(14, 0),
        MockProvider::new().reply(r#"{"thoughts": "tired", "actions": "nap", "duration": 30}"#),
        MockProvider::new().fail("analyzer down"),
    );
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("tick logged", || async move { log_len(scheduler).await == 1 }).await;
    eventually("next tick armed", || async move {
        scheduler.time_remaining() == Some(30 * MINUTE)
    })
    .await;

    let analyzed = f.engine.analyzer_log().latest().await.unwrap().unwrap();
    assert_eq!(analyzed.analysis, ActivityAnalysis::fallback());
    assert_eq!(analyzed.energy_change, -0.05);
    let state = f.engine.state().load().await;
    assert!((state.energy - 0.995).abs() < 1e-6);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_reply_schedules_backoff() {
    let f = fixture(
        at(14, 0),
        MockProvider::new().reply("let me think about it"),
        MockProvider::new(),
    );
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("backoff armed", || async move {
        scheduler.time_remaining() == Some(5 * MINUTE)
    })
    .await;
    assert_eq!(log_len(scheduler).await, 0);
    assert_eq!(f.engine.state().load().await.energy, 1.0);

    // The retick uses the default scripted reply and succeeds
    tokio::time::advance(5 * MINUTE).await;
    eventually("retick logged", || async move { log_len(scheduler).await == 1 }).await;
    assert_eq!(f.decider.call_count(), 2);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_huge_duration_keeps_loop_alive() {
    let f = fixture(
        at(14, 0),
        MockProvider::new()
            .reply(r#"{"thoughts": "x", "actions": "Watch the rain", "duration": "1e20"}"#),
        MockProvider::new().reply(WORK_ANALYSIS),
    );
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("tick logged", || async move { log_len(scheduler).await == 1 }).await;
    eventually("capped tick armed", || async move {
        scheduler.time_remaining() == Some(240 * MINUTE)
    })
    .await;
    assert!(scheduler.is_running());

    let decider = &*f.decider;
    tokio::time::advance(240 * MINUTE).await;
    eventually("next tick ran", || async move { decider.call_count() == 2 }).await;

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_rest_check_ignores_entries_from_before_start() {
    let f = fixture(
        at(22, 30),
        MockProvider::new().fail("down").fail("down").fail("down"),
        MockProvider::new(),
    );
    f.engine
        .activity_log()
        .append(ActivityLogEntry {
            timestamp: at(21, 0),
            weather: Weather::default(),
            energy: 0.15,
            mood: 0.5,
            thoughts: vec!["So sleepy".to_string()],
            actions: vec!["going to bed".to_string()],
            duration: 30,
        })
        .await
        .unwrap();
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("backoff armed", || async move {
        scheduler.time_remaining() == Some(5 * MINUTE)
    })
    .await;

    let decider = &*f.decider;
    f.clock.advance(chrono::Duration::minutes(15));
    tokio::time::advance(15 * MINUTE).await;
    eventually("retick attempted", || async move { decider.call_count() == 2 }).await;
    settle().await;

    assert_eq!(scheduler.phase(), Phase::Active);
    assert!(scheduler.rest_episode().is_none());
    assert_eq!(log_len(scheduler).await, 1);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_tick() {
    let f = fixture(
        at(14, 0),
        MockProvider::new()
            .reply(r#"{"thoughts": "x", "actions": "Work on portfolio", "duration": 10}"#)
            .with_delay(Duration::from_secs(30)),
        MockProvider::new().reply(WORK_ANALYSIS),
    );
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    let (decider, analyzer) = (&*f.decider, &*f.analyzer);
    eventually("decision requested", || async move { decider.call_count() == 1 }).await;
    assert!(scheduler.stop().await);

    tokio::time::advance(Duration::from_secs(60)).await;
    eventually("analysis requested", || async move { analyzer.call_count() == 1 }).await;
    settle().await;

    assert_eq!(log_len(scheduler).await, 0);
    assert!(f.engine.analyzer_log().entries().await.unwrap().is_empty());
    assert_eq!(f.engine.state().load().await.energy, 1.0);
    assert_eq!(scheduler.time_remaining(), None);
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_goes_straight_to_rest() {
    let f = fixture(at(13, 0), MockProvider::new(), MockProvider::new());
    f.engine.state().overwrite(0.05, 0.5).await;
    let scheduler = &TickScheduler::new(f.engine.clone());
    scheduler.start().await;

    eventually("entered rest", || async move { scheduler.phase() == Phase::Resting }).await;
    assert_eq!(f.decider.call_count(), 0);
    let episode = scheduler.rest_episode().unwrap();
    assert_eq!(episode.plan.duration, 60 * MINUTE);
    assert!((episode.start_energy - 0.05).abs() < 1e-6);

    let logged = f.engine.activity_log().latest().await.unwrap().unwrap();
    assert_eq!(logged.actions, vec!["sleep".to_string()]);

    scheduler.stop().await;
    assert_eq!(scheduler.phase(), Phase::Active);
}

#[tokio::test(start_paused = true)]
async fn test_restart_runs_a_fresh_tick() {
    let f = fixture(at(14, 0), MockProvider::new(), MockProvider::new());
    let scheduler = &TickScheduler::new(f.engine.clone());

    scheduler.start().await;
    eventually("first tick", || async move { log_len(scheduler).await == 1 }).await;
    scheduler.stop().await;

    scheduler.start().await;
    eventually("second tick", || async move { log_len(scheduler).await == 2 }).await;
    assert_eq!(f.decider.call_count(), 2);
    scheduler.stop().await;
}
