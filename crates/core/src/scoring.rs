//! Scoring module - combo state machine and placement points
//!
//! Stacking order of a placement score (kept literally; it is not commutative):
//!
//! 1. `base = floor(base_placement_score * (1 + streak * combo_increment))`
//! 2. `* tier factor`
//! 3. `* 2` for a rare variant
//! 4. score-multiplier effect: `* 3 + flat bonus`
//! 5. chain effect: `+ flat bonus` when the previous accepted record has the same category
//!
//! A resource-bonus effect adds clock time in time-bound modes instead of points.

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::generator::Budget;
use crate::timers::DecayTimer;
use crate::types::{Category, Mode, MultiplierTier, SpecialEffect, Token};

/// Streak, tier and the decaying combo window.
///
/// `tier` is always `MultiplierTier::from_streak(streak)` and the window is armed
/// iff `streak > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComboState {
    streak: u32,
    tier: MultiplierTier,
    max_streak: u32,
    window: DecayTimer,
}

impl ComboState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn tier(&self) -> MultiplierTier {
        self.tier
    }

    /// Best streak seen this session.
    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn window_deadline(&self) -> Option<u64> {
        self.window.deadline()
    }

    /// Valid accept: extend the streak and rearm the window.
    pub fn on_accept(&mut self, now_ms: u64, window_ms: u64) {
        self.streak += 1;
        self.tier = MultiplierTier::from_streak(self.streak);
        self.max_streak = self.max_streak.max(self.streak);
        self.window.arm(now_ms, window_ms);
    }

    /// Break the streak and cancel any pending decay.
    pub fn break_streak(&mut self) {
        self.streak = 0;
        self.tier = MultiplierTier::X1;
        self.window.cancel();
    }

    /// Time-driven decay. Returns true when the streak was dropped.
    pub fn decay(&mut self, now_ms: u64) -> bool {
        if self.window.fire_if_due(now_ms) {
            self.streak = 0;
            self.tier = MultiplierTier::X1;
            return true;
        }
        false
    }
}

/// Points and side effects of one accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Streak-scaled base before any multiplier.
    pub base: u64,
    pub total: u64,
    /// Seconds added to the clock.
    pub bonus_seconds: u32,
    pub chain_applied: bool,
}

/// Streak-scaled base points: `floor(base * (1 + streak * increment))`.
pub fn streak_base(streak: u32, tuning: &Tuning) -> u64 {
    let percent = 100u64 + streak as u64 * tuning.combo_increment_percent as u64;
    tuning.base_placement_score as u64 * percent / 100
}

/// Score an accept. `streak` and `tier` are the values after the accept was counted.
pub fn calculate_placement(
    token: &Token,
    streak: u32,
    tier: MultiplierTier,
    previous_category: Option<Category>,
    budget: &Budget,
    tuning: &Tuning,
) -> ScoreResult {
    let base = streak_base(streak, tuning);
    let mut points = base * tier.factor() as u64;

    if token.is_rare_variant {
        points *= tuning.rare_score_factor as u64;
    }

    let mut bonus_seconds = 0;
    let mut chain_applied = false;
    match token.special {
        SpecialEffect::ScoreMultiplier => {
            points = points * tuning.score_multiplier_factor as u64
                + tuning.score_multiplier_bonus as u64;
        }
        SpecialEffect::Chain => {
            if previous_category == Some(token.category) {
                points += tuning.chain_bonus as u64;
                chain_applied = true;
            }
        }
        SpecialEffect::ResourceBonus => {
            if budget.time_binds() {
                bonus_seconds = tuning.resource_bonus_seconds;
            }
        }
        SpecialEffect::None | SpecialEffect::Wildcard | SpecialEffect::Penalty => {}
    }

    ScoreResult {
        base,
        total: points,
        bonus_seconds,
        chain_applied,
    }
}

/// Moves consumed by a valid accept. Negative values refund.
///
/// Rare variants refund wherever moves bind outside the timed modes, so endless
/// refunds even though its clock also runs.
pub fn accept_move_cost(token: &Token, budget: &Budget, tuning: &Tuning) -> i32 {
    if token.is_discard {
        0
    } else if token.is_rare_variant
        && budget.moves_bind()
        && !matches!(budget.mode, Mode::Timed | Mode::Boss)
    {
        -tuning.rare_move_refund
    } else {
        1
    }
}

/// Moves consumed by a reject.
pub fn reject_move_cost(token: &Token, wrong_bin: bool, tuning: &Tuning) -> i32 {
    let mut cost = if wrong_bin {
        tuning.wrong_bin_move_cost
    } else {
        tuning.reject_move_cost
    };
    if token.special == SpecialEffect::Penalty {
        cost += tuning.penalty_effect_moves;
    }
    cost
}

/// Star rating for a won session (always at least one star).
pub fn star_rating(mistakes: u32, max_streak: u32, remaining_ratio: f32, tuning: &Tuning) -> u8 {
    let mut stars = 1;
    if mistakes == 0 && max_streak >= tuning.two_star_min_streak {
        stars = 2;
        if max_streak >= tuning.three_star_min_streak
            && remaining_ratio >= tuning.three_star_budget_ratio
        {
            stars = 3;
        }
    }
    stars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenId;

    fn token(category: Category) -> Token {
        Token::new(TokenId(1), category)
    }

    #[test]
    fn streak_base_scales_ten_percent_per_step() {
        let t = Tuning::default();
        assert_eq!(streak_base(0, &t), 100);
        assert_eq!(streak_base(1, &t), 110);
        assert_eq!(streak_base(3, &t), 130);
        assert_eq!(streak_base(7, &t), 170);
    }

    #[test]
    fn combo_accept_break_and_decay() {
        let mut c = ComboState::new();
        c.on_accept(0, 4_500);
        c.on_accept(1_000, 4_500);
        assert_eq!(c.streak(), 2);
        assert_eq!(c.tier(), MultiplierTier::X2);
        assert_eq!(c.window_deadline(), Some(5_500));

        assert!(!c.decay(5_499));
        assert!(c.decay(5_500));
        assert_eq!(c.streak(), 0);
        assert_eq!(c.tier(), MultiplierTier::X1);
        assert_eq!(c.window_deadline(), None);
        assert_eq!(c.max_streak(), 2);

        c.on_accept(6_000, 4_500);
        c.break_streak();
        assert_eq!(c.streak(), 0);
        assert_eq!(c.window_deadline(), None);
        assert!(!c.decay(100_000));
    }

    #[test]
    fn stacking_order_is_literal() {
        let t = Tuning::default();
        let budget = Budget::moves(Mode::Standard, 10);

        let plain = calculate_placement(&token(Category::Rock), 1, MultiplierTier::X1, None, &budget, &t);
        assert_eq!(plain.total, 110);

        let mut rare = token(Category::Rock);
        rare.is_rare_variant = true;
        let r = calculate_placement(&rare, 2, MultiplierTier::X2, None, &budget, &t);
        assert_eq!(r.total, 120 * 2 * 2);

        let mut mult = rare.clone();
        mult.special = SpecialEffect::ScoreMultiplier;
        let m = calculate_placement(&mult, 2, MultiplierTier::X2, None, &budget, &t);
        assert_eq!(m.total, 120 * 2 * 2 * 3 + 50);
    }

    #[test]
    fn chain_needs_same_previous_category() {
        let t = Tuning::default();
        let budget = Budget::moves(Mode::Standard, 10);
        let mut chain = token(Category::Jazz);
        chain.special = SpecialEffect::Chain;

        let hit = calculate_placement(&chain, 1, MultiplierTier::X1, Some(Category::Jazz), &budget, &t);
        assert!(hit.chain_applied);
        assert_eq!(hit.total, 110 + 75);

        let miss = calculate_placement(&chain, 1, MultiplierTier::X1, Some(Category::Rock), &budget, &t);
        assert!(!miss.chain_applied);
        assert_eq!(miss.total, 110);
    }

    #[test]
    fn resource_bonus_only_extends_clock_when_time_binds() {
        let t = Tuning::default();
        let mut tk = token(Category::Soul);
        tk.special = SpecialEffect::ResourceBonus;

        let timed = Budget::timed(Mode::Timed, 60);
        assert_eq!(calculate_placement(&tk, 1, MultiplierTier::X1, None, &timed, &t).bonus_seconds, 5);

        let moves = Budget::moves(Mode::Standard, 10);
        assert_eq!(calculate_placement(&tk, 1, MultiplierTier::X1, None, &moves, &t).bonus_seconds, 0);
    }

    #[test]
    fn move_costs() {
        let t = Tuning::default();
        let moves = Budget::moves(Mode::Standard, 10);
        let timed = Budget::timed(Mode::Timed, 60);
        let endless = Budget::both(Mode::Endless, 10, 60);

        let mut rare = token(Category::Rock);
        rare.is_rare_variant = true;
        assert_eq!(accept_move_cost(&rare, &moves, &t), -3);
        assert_eq!(accept_move_cost(&rare, &timed, &t), 1);
        assert_eq!(accept_move_cost(&rare, &endless, &t), -3);
        assert_eq!(accept_move_cost(&token(Category::Rock), &endless, &t), 1);
        assert_eq!(accept_move_cost(&token(Category::Rock), &moves, &t), 1);
        assert_eq!(accept_move_cost(&Token::discard(TokenId(9)), &moves, &t), 0);

        let mut penalty = token(Category::Rock);
        penalty.special = SpecialEffect::Penalty;
        assert_eq!(reject_move_cost(&token(Category::Rock), false, &t), 1);
        assert_eq!(reject_move_cost(&penalty, false, &t), 3);
        assert_eq!(reject_move_cost(&Token::discard(TokenId(9)), true, &t), 2);
    }

    #[test]
    fn stars() {
        let t = Tuning::default();
        assert_eq!(star_rating(1, 20, 1.0, &t), 1);
        assert_eq!(star_rating(0, 2, 1.0, &t), 1);
        assert_eq!(star_rating(0, 3, 1.0, &t), 2);
        assert_eq!(star_rating(0, 5, 0.1, &t), 2);
        assert_eq!(star_rating(0, 5, 0.2, &t), 3);
    }
}
