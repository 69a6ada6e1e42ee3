//! Engine module - placement controller, target resolvers and the command surface
//!
//! Sits between a presentation (terminal shelf, TCP client, anything that can
//! produce pointer samples) and the deterministic rules in `crate-digger-core`.
//!
//! - [`placement`]: the `Idle -> Armed -> Targeting -> Committed | Cancelled` state machine
//! - [`resolver`]: injected geometry ([`MagneticResolver`], [`ShelfResolver`])
//! - [`engine`]: [`Engine`], one session at a time, events out

pub mod engine;
pub mod placement;
pub mod resolver;

pub use crate_digger_core as core;
pub use crate_digger_types as types;

pub use engine::{Engine, EngineOptions, DEFAULT_SEED};
pub use placement::{evaluate, ArmOutcome, CommitOutcome, PlacementController, PlacementState, Validity};
pub use resolver::{MagneticResolver, ShelfResolver, TargetResolver};
