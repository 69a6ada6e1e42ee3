//! Engine events emitted to presentation, audio, achievements and the adapter.
//!
//! Collaborators are only notified; they make no decisions of their own.

use serde::{Deserialize, Serialize};

use crate::{ContainerId, MultiplierTier, RejectReason, Target, TokenId};

/// Why a session was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    OutOfMoves,
    OutOfTime,
    /// A mistake in hard-fail mode.
    Mistake,
}

/// Final numbers of a won session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub score: u64,
    pub stars: u8,
    pub max_streak: u32,
    pub mistakes: u32,
    pub moves_remaining: i32,
    pub time_remaining: u32,
    pub elapsed_ms: u64,
}

/// Everything the engine reports to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EngineEvent {
    SessionStarted {
        session_id: u32,
        progression: u32,
    },
    TokenArmed {
        token_id: TokenId,
    },
    TokenCleaned {
        token_id: TokenId,
        griminess: u8,
    },
    TokenRevealed {
        token_id: TokenId,
    },
    TargetChanged {
        target: Target,
        is_valid: bool,
    },
    TokenAccepted {
        token_id: TokenId,
        target: Target,
        /// Front-most free slot before the fill count was incremented.
        slot: u8,
        points_awarded: u64,
        new_streak: u32,
        tier: MultiplierTier,
    },
    TokenRejected {
        token_id: TokenId,
        reason: RejectReason,
        removed: bool,
    },
    TokenReturned {
        token_id: TokenId,
    },
    ComboDecayed,
    TimeTick {
        time_remaining: u32,
    },
    HintRevealed {
        token_id: TokenId,
        container_id: ContainerId,
    },
    ObjectiveCompleted {
        objective_id: u32,
        bonus_reward: u32,
    },
    SessionWon {
        stats: SessionStats,
    },
    SessionLost {
        reason: LossReason,
    },
}

impl EngineEvent {
    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineEvent::SessionWon { .. } | EngineEvent::SessionLost { .. }
        )
    }
}
