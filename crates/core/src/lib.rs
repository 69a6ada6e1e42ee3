//! Core puzzle logic module - pure, deterministic, and testable
//!
//! This crate contains the rules of the record-sorting puzzle: level generation,
//! the combo and scoring state machine, the objective tracker and the session
//! state that ties them together. It has **zero dependencies** on rendering,
//! networking or pointer geometry:
//!
//! - **Deterministic**: the same `(progression, difficulty, endless, seed)` builds the same level
//! - **Clock-explicit**: every time-dependent call takes `now_ms`; timers are deadlines, not callbacks
//! - **Testable**: each rule is a free function or a small state type with unit tests
//!
//! # Module Structure
//!
//! - [`generator`]: crates, dig pile and budget for a progression index
//! - [`scoring`]: combo state machine, placement points, move costs, star rating
//! - [`timers`]: single-shot decay deadline and recurring budget countdown
//! - [`counters`]: the per-session counters value object
//! - [`objectives`]: auxiliary goals evaluated against counters snapshots
//! - [`session`]: one level being played (accept / reject / hint / tick)
//! - [`profile`]: the profile collaborator read at start and written at end
//! - [`config`]: serde-backed tuning
//! - [`rng`]: seeded LCG
//!
//! # Example
//!
//! ```
//! use crate_digger_core::{generate_level, LevelParams, Session, Tuning};
//! use crate_digger_core::types::{Difficulty, Target};
//!
//! let tuning = Tuning::default();
//! let level = generate_level(LevelParams::new(0, Difficulty::Normal, false, 7), &tuning);
//! let mut session = Session::new(1, level, tuning, 0, false);
//!
//! // Sort the first record into the crate that wants it.
//! let token = session.tokens_in_play().find(|t| !t.is_discard && t.is_manipulable()).cloned();
//! if let Some(token) = token {
//!     let crate_id = session
//!         .containers()
//!         .iter()
//!         .find(|c| c.category == token.category)
//!         .map(|c| c.id)
//!         .unwrap();
//!     let accepted = session.accept(token.id, Target::Container(crate_id), 100).unwrap();
//!     assert_eq!(accepted.streak, 1);
//! }
//! ```
//!
//! # Timing
//!
//! | Timer | Kind | Default |
//! |-------|------|---------|
//! | combo decay | single-shot, rearmed on accept | 4500 ms |
//! | budget countdown | recurring, timed/boss/endless only | 1000 ms |
//!
//! Call [`Session::tick`](session::Session::tick) from the scheduler; both timers fire
//! from the tick alone, without further input.

pub mod config;
pub mod counters;
pub mod error;
pub mod generator;
pub mod objectives;
pub mod profile;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod timers;

pub use crate_digger_types as types;

// Re-export commonly used types for convenience
pub use config::{DifficultyProfile, Tuning, TUNING_ENV};
pub use counters::SessionCounters;
pub use error::{EngineError, Result};
pub use generator::{generate_level, Budget, Level, LevelParams};
pub use objectives::{Objective, ObjectiveKind, ObjectiveTracker};
pub use profile::{LevelBest, MemoryProfile, ProfileStore, SessionReport};
pub use rng::{mix_seed, SimpleRng};
pub use scoring::{calculate_placement, star_rating, ComboState, ScoreResult};
pub use session::{Accepted, Phase, Rejected, Session};
pub use snapshot::{ComboSnapshot, SessionSnapshot};
pub use timers::{CountdownTimer, DecayTimer};
