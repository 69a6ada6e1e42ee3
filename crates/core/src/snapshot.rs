use serde::{Deserialize, Serialize};

use crate::counters::SessionCounters;
use crate::generator::Budget;
use crate::objectives::Objective;
use crate::session::{Phase, Session};
use crate::types::{Container, Mode, MultiplierTier, Theme, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSnapshot {
    pub streak: u32,
    pub tier: MultiplierTier,
    pub max_streak: u32,
    pub window_deadline: Option<u64>,
}

/// Read-only view of a live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: u32,
    pub progression: u32,
    pub mode: Mode,
    pub theme: Theme,
    pub phase: Phase,
    pub containers: Vec<Container>,
    /// Unresolved tokens in placement order.
    pub tokens: Vec<Token>,
    pub budget: Budget,
    pub combo: ComboSnapshot,
    pub score: u64,
    pub counters: SessionCounters,
    pub objectives: Vec<Objective>,
    pub pending_flings: u32,
}

impl SessionSnapshot {
    pub fn playable(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// The token shown at the front of the tray.
    pub fn front_token(&self) -> Option<&Token> {
        self.tokens.first()
    }
}

impl From<&Session> for SessionSnapshot {
    fn from(s: &Session) -> Self {
        let combo = s.combo();
        Self {
            session_id: s.id(),
            progression: s.level().params.progression,
            mode: s.mode(),
            theme: s.level().theme,
            phase: s.phase(),
            containers: s.containers().to_vec(),
            tokens: s.tokens_in_play().cloned().collect(),
            budget: *s.budget(),
            combo: ComboSnapshot {
                streak: combo.streak(),
                tier: combo.tier(),
                max_streak: combo.max_streak(),
                window_deadline: combo.window_deadline(),
            },
            score: s.score(),
            counters: s.counters(),
            objectives: s.objectives().objectives().to_vec(),
            pending_flings: s.pending_flings(),
        }
    }
}
