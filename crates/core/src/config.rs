//! Tuning configuration.
//!
//! Every balance constant lives in [`Tuning`]. `Tuning::default()` is the reference
//! tuning; a JSON file can override any subset of fields.
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `initial_categories` | 3 | categories unlocked at progression 0 |
//! | `unlock_interval` | 3 | one more category every N levels |
//! | `min_containers` / `max_containers` | 2 / 6 | shelf size bounds |
//! | `container_increase_interval` | 4 | one more crate every N levels |
//! | `capacity_interval` | 5 | one more slot per crate every N levels |
//! | `timed_min_level` / `timed_interval` | 4 / 4 | timed mode gate |
//! | `hard_fail_min_level` / `hard_fail_interval` | 7 / 6 | hard-fail mode gate |
//! | `decay_window_ms` | 4500 | combo window |
//! | `base_placement_score` | 100 | points before streak scaling |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{Difficulty, DECAY_WINDOW_MS, MAX_GRIMINESS, RARE_MOVE_REFUND};

/// Environment variable pointing at a JSON tuning file.
pub const TUNING_ENV: &str = "CRATE_DIGGER_TUNING";

/// Per-difficulty knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyProfile {
    pub min_capacity: u8,
    pub move_buffer: u32,
    pub discard_multiplier: f32,
    pub per_token_seconds: f32,
    pub rare_chance: f32,
    pub undiscovered_chance: f32,
    pub grimy_chance: f32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::normal()
    }
}

impl DifficultyProfile {
    pub fn easy() -> Self {
        Self {
            min_capacity: 2,
            move_buffer: 8,
            discard_multiplier: 0.5,
            per_token_seconds: 4.0,
            rare_chance: 0.08,
            undiscovered_chance: 0.05,
            grimy_chance: 0.05,
        }
    }

    pub fn normal() -> Self {
        Self {
            min_capacity: 3,
            move_buffer: 5,
            discard_multiplier: 1.0,
            per_token_seconds: 3.0,
            rare_chance: 0.06,
            undiscovered_chance: 0.08,
            grimy_chance: 0.08,
        }
    }

    pub fn hard() -> Self {
        Self {
            min_capacity: 4,
            move_buffer: 3,
            discard_multiplier: 1.5,
            per_token_seconds: 2.2,
            rare_chance: 0.04,
            undiscovered_chance: 0.12,
            grimy_chance: 0.12,
        }
    }
}

/// Full balance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Generation
    pub initial_categories: u32,
    pub unlock_interval: u32,
    pub min_containers: u32,
    pub max_containers: u32,
    pub container_increase_interval: u32,
    pub endless_container_interval: u32,
    pub capacity_interval: u32,
    pub max_capacity: u8,
    pub boss_interval: u32,
    pub timed_min_level: u32,
    pub timed_interval: u32,
    pub hard_fail_min_level: u32,
    pub hard_fail_interval: u32,
    pub special_min_level: u32,
    pub special_pool_divisor: u32,
    pub start_griminess: u8,
    pub labels_per_category: u16,

    // Budget
    pub min_timed_seconds: u32,
    pub boss_seconds_per_token: f32,
    pub endless_scale_step: f32,

    // Scoring
    pub decay_window_ms: u64,
    pub base_placement_score: u32,
    pub combo_increment_percent: u32,
    pub rare_score_factor: u32,
    pub score_multiplier_factor: u32,
    pub score_multiplier_bonus: u32,
    pub chain_bonus: u32,
    pub resource_bonus_seconds: u32,
    pub rare_move_refund: i32,
    pub reject_move_cost: i32,
    pub wrong_bin_move_cost: i32,
    pub penalty_effect_moves: i32,

    // Stars
    pub two_star_min_streak: u32,
    pub three_star_min_streak: u32,
    pub three_star_budget_ratio: f32,

    // Hints
    pub hint_move_cost: i32,
    pub hint_min_profile_level: u32,

    // Objectives
    pub second_objective_level: u32,

    pub easy: DifficultyProfile,
    pub normal: DifficultyProfile,
    pub hard: DifficultyProfile,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_categories: 3,
            unlock_interval: 3,
            min_containers: 2,
            max_containers: 6,
            container_increase_interval: 4,
            endless_container_interval: 3,
            capacity_interval: 5,
            max_capacity: 10,
            boss_interval: 10,
            timed_min_level: 4,
            timed_interval: 4,
            hard_fail_min_level: 7,
            hard_fail_interval: 6,
            special_min_level: 2,
            special_pool_divisor: 7,
            start_griminess: MAX_GRIMINESS,
            labels_per_category: 24,

            min_timed_seconds: 30,
            boss_seconds_per_token: 1.5,
            endless_scale_step: 0.02,

            decay_window_ms: DECAY_WINDOW_MS,
            base_placement_score: 100,
            combo_increment_percent: 10,
            rare_score_factor: 2,
            score_multiplier_factor: 3,
            score_multiplier_bonus: 50,
            chain_bonus: 75,
            resource_bonus_seconds: 5,
            rare_move_refund: RARE_MOVE_REFUND,
            reject_move_cost: 1,
            wrong_bin_move_cost: 2,
            penalty_effect_moves: 2,

            two_star_min_streak: 3,
            three_star_min_streak: 5,
            three_star_budget_ratio: 0.2,

            hint_move_cost: 1,
            hint_min_profile_level: 0,

            second_objective_level: 5,

            easy: DifficultyProfile::easy(),
            normal: DifficultyProfile::normal(),
            hard: DifficultyProfile::hard(),
        }
    }
}

impl Tuning {
    pub fn difficulty(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Normal => &self.normal,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Parse a (possibly partial) JSON tuning document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(s)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Load from `CRATE_DIGGER_TUNING` if set, defaults otherwise.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(TUNING_ENV) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(t) => {
                tracing::info!(path = %path, "loaded tuning");
                t
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "failed to load tuning, using defaults");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.min_containers == 0 || self.min_containers > self.max_containers {
            return Err(EngineError::Config(format!(
                "container bounds {}..={} are empty",
                self.min_containers, self.max_containers
            )));
        }
        if self.initial_categories == 0 {
            return Err(EngineError::Config("initial_categories must be > 0".into()));
        }
        if self.boss_interval == 0 || self.timed_interval == 0 || self.hard_fail_interval == 0 {
            return Err(EngineError::Config("mode intervals must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let t = Tuning::from_json_str(r#"{"decay_window_ms": 3000, "hard": {"move_buffer": 1}}"#)
            .unwrap();
        assert_eq!(t.decay_window_ms, 3000);
        assert_eq!(t.base_placement_score, 100);
        assert_eq!(t.hard.move_buffer, 1);
        // Nested defaults fall back to the normal profile.
        assert_eq!(t.hard.min_capacity, DifficultyProfile::normal().min_capacity);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let err = Tuning::from_json_str(r#"{"min_containers": 5, "max_containers": 2}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Tuning::from_json_str("{not json"),
            Err(EngineError::Json(_))
        ));
    }
}
