//! # Selena Limbic System
//!
//! Fast, non-verbal regulation of the character's body: when to rest, how
//! long a rest lasts, how much it restores, and what the character says
//! about it on waking.
//!
//! ## Rest cycle
//!
//! `Active -> Resting -> Active`. A rest episode is planned from the
//! time-of-day bucket it starts in; recovery is computed up front and
//! applied when the character wakes.

mod heartbeat;
mod rest;

pub use heartbeat::HeartbeatConfig;
pub use rest::{
    mentions_rest, RestEpisode, RestPlan, RestStateMachine, WakeNarration, WakeUp,
};
