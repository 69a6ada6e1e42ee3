//! Profile collaborator.
//!
//! The engine reads the profile at session start (hint gating) and writes one
//! [`SessionReport`] at session end. Storage is the collaborator's business;
//! [`MemoryProfile`] keeps everything in memory.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{Category, LossReason, Mode};

/// Summary handed to the profile when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub progression: u32,
    pub mode: Mode,
    pub won: bool,
    pub loss_reason: Option<LossReason>,
    pub score: u64,
    pub stars: u8,
    pub max_streak: u32,
    pub mistakes: u32,
    pub elapsed_ms: u64,
    pub sorted: u32,
    pub objective_bonus: u32,
    /// Rare records accepted this session, as `(category, label)`.
    pub collected: Vec<(Category, u16)>,
}

pub trait ProfileStore: Send {
    /// Player level used to gate hints.
    fn profile_level(&self) -> u32;

    fn record_session(&mut self, report: &SessionReport);
}

/// Per-level personal bests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelBest {
    pub score: u64,
    pub combo: u32,
    /// Fastest win, if any.
    pub time_ms: Option<u64>,
    pub stars: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryProfile {
    pub level: u32,
    pub progression_points: u64,
    pub total_sorted: u64,
    pub wins: u32,
    pub losses: u32,
    pub perfect: u32,
    pub max_combo_ever: u32,
    pub bests: BTreeMap<u32, LevelBest>,
    pub collection: BTreeSet<(Category, u16)>,
}

impl MemoryProfile {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

impl ProfileStore for MemoryProfile {
    fn profile_level(&self) -> u32 {
        self.level
    }

    fn record_session(&mut self, report: &SessionReport) {
        self.total_sorted += report.sorted as u64;
        self.max_combo_ever = self.max_combo_ever.max(report.max_streak);
        self.progression_points += report.objective_bonus as u64;

        if report.won {
            self.wins += 1;
            if report.mistakes == 0 {
                self.perfect += 1;
            }
        } else {
            self.losses += 1;
        }

        let best = self.bests.entry(report.progression).or_default();
        best.score = best.score.max(report.score);
        best.combo = best.combo.max(report.max_streak);
        if report.won {
            best.stars = best.stars.max(report.stars);
            best.time_ms = Some(match best.time_ms {
                Some(t) => t.min(report.elapsed_ms),
                None => report.elapsed_ms,
            });
        }

        for entry in &report.collected {
            self.collection.insert(*entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(won: bool, score: u64, elapsed_ms: u64) -> SessionReport {
        SessionReport {
            progression: 3,
            mode: Mode::Standard,
            won,
            loss_reason: if won { None } else { Some(LossReason::OutOfMoves) },
            score,
            stars: if won { 2 } else { 0 },
            max_streak: 4,
            mistakes: 0,
            elapsed_ms,
            sorted: 6,
            objective_bonus: 25,
            collected: vec![(Category::Jazz, 3)],
        }
    }

    #[test]
    fn bests_keep_the_best_and_collection_dedups() {
        let mut p = MemoryProfile::new(1);
        p.record_session(&report(true, 900, 40_000));
        p.record_session(&report(true, 700, 30_000));
        p.record_session(&report(false, 1_200, 10_000));

        let best = p.bests[&3];
        assert_eq!(best.score, 1_200);
        assert_eq!(best.time_ms, Some(30_000));
        assert_eq!(best.stars, 2);
        assert_eq!(p.wins, 2);
        assert_eq!(p.losses, 1);
        assert_eq!(p.perfect, 2);
        assert_eq!(p.total_sorted, 18);
        assert_eq!(p.collection.len(), 1);
        assert_eq!(p.progression_points, 75);
    }
}
