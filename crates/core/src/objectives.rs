//! Objective tracker - auxiliary session goals that pay a bonus reward
//!
//! Objectives are generated at session start from the progression index and mode
//! alone, then re-evaluated against each [`SessionCounters`] snapshot. Completion
//! is write-once. The tracker only reads counters; it never feeds back into score
//! or budget, and the bonus is paid into profile progression at session end.
//!
//! | Kind | From level | Target | Completes when |
//! |------|-----------|--------|----------------|
//! | `Perfect` | 0 | - | won with zero mistakes |
//! | `NoHints` | 0 | - | won without hints |
//! | `Combo` | 1 | 3 / 5 / 7 | streak reaches target |
//! | `Speed` | 3 | seconds | won within target (move-bound modes only) |
//! | `Clean` | 2 | - | every grimy record cleaned |
//! | `Discards` | 2 | - | every discard binned |
//! | `Score` | 4 | points | score reaches target |

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::counters::SessionCounters;
use crate::rng::{mix_seed, SimpleRng};
use crate::types::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    Perfect,
    NoHints,
    Combo,
    Speed,
    Clean,
    Discards,
    Score,
}

struct CatalogEntry {
    kind: ObjectiveKind,
    min_progression: u32,
    weight: u32,
    bonus_reward: u32,
}

const CATALOG: [CatalogEntry; 7] = [
    CatalogEntry { kind: ObjectiveKind::Perfect, min_progression: 0, weight: 3, bonus_reward: 50 },
    CatalogEntry { kind: ObjectiveKind::NoHints, min_progression: 0, weight: 2, bonus_reward: 25 },
    CatalogEntry { kind: ObjectiveKind::Combo, min_progression: 1, weight: 3, bonus_reward: 40 },
    CatalogEntry { kind: ObjectiveKind::Speed, min_progression: 3, weight: 2, bonus_reward: 60 },
    CatalogEntry { kind: ObjectiveKind::Clean, min_progression: 2, weight: 2, bonus_reward: 30 },
    CatalogEntry { kind: ObjectiveKind::Discards, min_progression: 2, weight: 2, bonus_reward: 30 },
    CatalogEntry { kind: ObjectiveKind::Score, min_progression: 4, weight: 2, bonus_reward: 45 },
];

/// One session goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: u32,
    pub kind: ObjectiveKind,
    pub target: Option<u32>,
    pub current: Option<u32>,
    pub completed: bool,
    pub bonus_reward: u32,
}

impl Objective {
    pub fn new(id: u32, kind: ObjectiveKind, target: Option<u32>, bonus_reward: u32) -> Self {
        Self {
            id,
            kind,
            target,
            current: target.map(|_| 0),
            completed: false,
            bonus_reward,
        }
    }

    fn progress(&self, c: &SessionCounters) -> Option<u32> {
        match self.kind {
            ObjectiveKind::Combo => Some(c.max_streak),
            ObjectiveKind::Speed => Some(c.elapsed_secs()),
            ObjectiveKind::Score => Some(c.score.min(u32::MAX as u64) as u32),
            _ => None,
        }
    }

    /// Completion predicate against one counters snapshot.
    pub fn is_satisfied(&self, c: &SessionCounters) -> bool {
        let target = self.target.unwrap_or(0);
        match self.kind {
            ObjectiveKind::Perfect => c.won && c.mistakes == 0,
            ObjectiveKind::NoHints => c.won && c.hints_used == 0,
            ObjectiveKind::Combo => c.max_streak >= target,
            ObjectiveKind::Speed => c.won && c.elapsed_secs() <= target,
            ObjectiveKind::Clean => {
                c.all_grime_cleaned() && (c.grimy_total > 0 || c.won)
            }
            ObjectiveKind::Discards => {
                c.all_discards_binned() && (c.discards_total > 0 || c.won)
            }
            ObjectiveKind::Score => c.score >= target as u64,
        }
    }
}

/// Streak target for the combo objective.
pub fn combo_target(progression: u32) -> u32 {
    if progression < 6 {
        3
    } else if progression < 10 {
        5
    } else {
        7
    }
}

fn target_for(kind: ObjectiveKind, progression: u32) -> Option<u32> {
    match kind {
        ObjectiveKind::Combo => Some(combo_target(progression)),
        ObjectiveKind::Speed => Some((45 + 5 * (progression / 2)).min(180)),
        ObjectiveKind::Score => Some(1_000 + 250 * progression),
        _ => None,
    }
}

fn eligible(entry: &CatalogEntry, progression: u32, mode: Mode) -> bool {
    if progression < entry.min_progression {
        return false;
    }
    // The clock already pressures time-bound modes.
    !(entry.kind == ObjectiveKind::Speed && mode.binds_time())
}

fn mode_salt(mode: Mode) -> u32 {
    match mode {
        Mode::Standard => 1,
        Mode::Timed => 2,
        Mode::HardFail => 3,
        Mode::Boss => 4,
        Mode::Endless => 5,
    }
}

/// Tracks the session's objectives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    objectives: Vec<Objective>,
}

impl ObjectiveTracker {
    /// Deterministic in `(progression, mode)`.
    pub fn generate(progression: u32, mode: Mode, tuning: &Tuning) -> Self {
        let mut rng = SimpleRng::new(mix_seed(progression, mode_salt(mode)));
        let wanted = if progression < tuning.second_objective_level { 1 } else { 2 };

        let mut pool: Vec<&CatalogEntry> = CATALOG
            .iter()
            .filter(|e| eligible(e, progression, mode))
            .collect();

        let mut objectives = Vec::with_capacity(wanted);
        while objectives.len() < wanted && !pool.is_empty() {
            let total: u32 = pool.iter().map(|e| e.weight).sum();
            let mut roll = rng.next_range(total);
            let mut picked = pool.len() - 1;
            for (i, e) in pool.iter().enumerate() {
                if roll < e.weight {
                    picked = i;
                    break;
                }
                roll -= e.weight;
            }
            let entry = pool.remove(picked);
            objectives.push(Objective::new(
                objectives.len() as u32,
                entry.kind,
                target_for(entry.kind, progression),
                entry.bonus_reward,
            ));
        }

        Self { objectives }
    }

    pub fn from_objectives(objectives: Vec<Objective>) -> Self {
        Self { objectives }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Re-evaluate incomplete objectives; returns the ones that just completed.
    pub fn update(&mut self, counters: &SessionCounters) -> Vec<Objective> {
        let mut newly = Vec::new();
        for o in self.objectives.iter_mut().filter(|o| !o.completed) {
            o.current = o.progress(counters);
            if o.is_satisfied(counters) {
                o.completed = true;
                newly.push(o.clone());
            }
        }
        newly
    }

    /// Bonus owed for completed objectives.
    pub fn total_bonus(&self) -> u32 {
        self.objectives
            .iter()
            .filter(|o| o.completed)
            .map(|o| o.bonus_reward)
            .sum()
    }
}
