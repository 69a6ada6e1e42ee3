//! Level generator - builds the crates, the dig pile and the budget for a level
//!
//! Generation is pure and total: every scaled quantity is clamped, so any
//! progression index produces a playable level. All randomness comes from one
//! [`SimpleRng`] seeded by [`LevelParams::seed`].
//!
//! Pipeline:
//!
//! 1. Unlock categories (prefix of [`Category::ALL`])
//! 2. Select the mode (boss > endless > timed > hard-fail > standard)
//! 3. Size the shelf and sample crate categories without replacement
//! 4. Roll crate capacities
//! 5. Fill every slot with a record (rare / undiscovered / grimy rolls)
//! 6. Tag special effects
//! 7. Add discard tokens
//! 8. Fisher-Yates shuffle: the only source of placement order
//! 9. Derive the budget

use serde::{Deserialize, Serialize};

use crate::config::{DifficultyProfile, Tuning};
use crate::rng::SimpleRng;
use crate::types::{
    Category, Container, ContainerId, Difficulty, Mode, RevealState, SpecialEffect, Theme, Token,
    TokenId, UNLIMITED_MOVES, UNLIMITED_SECONDS,
};

/// Generator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelParams {
    pub progression: u32,
    pub difficulty: Difficulty,
    pub endless: bool,
    pub seed: u32,
}

impl LevelParams {
    pub fn new(progression: u32, difficulty: Difficulty, endless: bool, seed: u32) -> Self {
        Self {
            progression,
            difficulty,
            endless,
            seed,
        }
    }
}

/// Session resource budget. The non-binding resource holds its unlimited sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub mode: Mode,
    pub moves_remaining: i32,
    /// Starting moves, the reference for the three-star ratio.
    pub initial_moves: i32,
    pub time_remaining: u32,
    pub max_time: u32,
}

impl Budget {
    /// Move-bound budget.
    pub fn moves(mode: Mode, moves: i32) -> Self {
        Self {
            mode,
            moves_remaining: moves,
            initial_moves: moves,
            time_remaining: UNLIMITED_SECONDS,
            max_time: UNLIMITED_SECONDS,
        }
    }

    /// Time-bound budget.
    pub fn timed(mode: Mode, seconds: u32) -> Self {
        Self {
            mode,
            moves_remaining: UNLIMITED_MOVES,
            initial_moves: UNLIMITED_MOVES,
            time_remaining: seconds,
            max_time: seconds,
        }
    }

    /// Both resources bind (endless mode).
    pub fn both(mode: Mode, moves: i32, seconds: u32) -> Self {
        Self {
            mode,
            moves_remaining: moves,
            initial_moves: moves,
            time_remaining: seconds,
            max_time: seconds,
        }
    }

    pub fn moves_bind(&self) -> bool {
        self.mode.binds_moves() && self.initial_moves != UNLIMITED_MOVES
    }

    pub fn time_binds(&self) -> bool {
        self.mode.binds_time() && self.max_time != UNLIMITED_SECONDS
    }

    /// Spend (positive) or refund (negative) moves. No-op when moves do not bind.
    pub fn spend_moves(&mut self, cost: i32) {
        if self.moves_bind() {
            self.moves_remaining = self.moves_remaining.saturating_sub(cost);
        }
    }

    /// Fraction of the binding resource still available, in [0, 1].
    pub fn remaining_ratio(&self) -> f32 {
        if self.moves_bind() && self.initial_moves > 0 {
            (self.moves_remaining.max(0) as f32 / self.initial_moves as f32).min(1.0)
        } else if self.time_binds() && self.max_time > 0 {
            (self.time_remaining as f32 / self.max_time as f32).min(1.0)
        } else {
            1.0
        }
    }
}

/// A generated (or handcrafted) level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub params: LevelParams,
    pub theme: Theme,
    pub containers: Vec<Container>,
    /// Placement order.
    pub tokens: Vec<Token>,
    pub budget: Budget,
}

impl Level {
    /// Build a level by hand (tests, tutorials, replays).
    pub fn handcrafted(containers: Vec<Container>, tokens: Vec<Token>, budget: Budget) -> Self {
        Self {
            params: LevelParams::new(0, Difficulty::Normal, budget.mode == Mode::Endless, 1),
            theme: Theme::Basement,
            containers,
            tokens,
            budget,
        }
    }

    pub fn mode(&self) -> Mode {
        self.budget.mode
    }

    pub fn total_capacity(&self) -> u32 {
        self.containers.iter().map(|c| c.capacity as u32).sum()
    }

    pub fn non_discard_count(&self) -> usize {
        self.tokens.iter().filter(|t| !t.is_discard).count()
    }
}

/// Number of categories unlocked at `progression`.
pub fn unlocked_category_count(progression: u32, tuning: &Tuning) -> usize {
    let unlocked = tuning.initial_categories + progression / tuning.unlock_interval.max(1);
    (unlocked as usize).clamp(1, Category::ALL.len())
}

/// Mode selection, first match wins.
pub fn select_mode(progression: u32, endless: bool, tuning: &Tuning) -> Mode {
    if (progression + 1) % tuning.boss_interval.max(1) == 0 {
        Mode::Boss
    } else if endless {
        Mode::Endless
    } else if progression > tuning.timed_min_level
        && progression % tuning.timed_interval.max(1) == 0
    {
        Mode::Timed
    } else if progression > tuning.hard_fail_min_level
        && progression % tuning.hard_fail_interval.max(1) == 0
    {
        Mode::HardFail
    } else {
        Mode::Standard
    }
}

/// Shelf size for a level, never more than the unlocked categories.
pub fn container_count(progression: u32, mode: Mode, unlocked: usize, tuning: &Tuning) -> usize {
    let min = tuning.min_containers;
    let max = tuning.max_containers.max(min);
    let count = match mode {
        Mode::Endless => {
            (min + progression / tuning.endless_container_interval.max(1)).clamp(min, max)
        }
        Mode::Boss => {
            (min + progression / tuning.container_increase_interval.max(1)).clamp(min, max) + 1
        }
        _ => (min + progression / tuning.container_increase_interval.max(1)).clamp(min, max),
    };
    (count as usize).min(unlocked).max(1)
}

fn roll_capacity(
    progression: u32,
    profile: &DifficultyProfile,
    tuning: &Tuning,
    rng: &mut SimpleRng,
) -> u8 {
    let extra = progression / tuning.capacity_interval.max(1);
    let capacity = rng.next_range(2) + profile.min_capacity as u32 + extra;
    capacity.clamp(1, tuning.max_capacity.max(1) as u32) as u8
}

/// Number of discard tokens on the pile.
pub fn discard_count(progression: u32, profile: &DifficultyProfile) -> usize {
    let raw = profile.discard_multiplier * ((progression / 2) + 1) as f32;
    raw.max(0.0).floor() as usize
}

pub fn theme_for(progression: u32, mode: Mode) -> Theme {
    if mode == Mode::Boss {
        Theme::Vault
    } else {
        Theme::ROTATION[((progression / 5) as usize) % Theme::ROTATION.len()]
    }
}

/// Budget for a mode, given the pile composition.
pub fn compute_budget(
    mode: Mode,
    progression: u32,
    non_discard: usize,
    total: usize,
    profile: &DifficultyProfile,
    tuning: &Tuning,
) -> Budget {
    let non_discard = non_discard as u32;
    let total = total as u32;
    let timed_seconds =
        ((total as f32 * profile.per_token_seconds).floor() as u32).max(tuning.min_timed_seconds);

    match mode {
        Mode::Standard => Budget::moves(mode, (non_discard + profile.move_buffer) as i32),
        Mode::Timed => Budget::timed(mode, timed_seconds),
        Mode::HardFail => Budget::moves(mode, (total + 1) as i32),
        Mode::Boss => {
            let seconds = (total as f32 * tuning.boss_seconds_per_token).floor() as u32;
            Budget::timed(mode, seconds.max(1))
        }
        Mode::Endless => {
            let scale = (1.0 - tuning.endless_scale_step * progression as f32).max(0.0);
            let moves = (((non_discard + profile.move_buffer) as f32 * scale).floor() as u32)
                .max(non_discard);
            let seconds = ((total as f32 * profile.per_token_seconds * scale).floor() as u32)
                .max(tuning.min_timed_seconds);
            Budget::both(mode, moves as i32, seconds)
        }
    }
}

/// Build the level for `params`.
pub fn generate_level(params: LevelParams, tuning: &Tuning) -> Level {
    let mut rng = SimpleRng::new(params.seed);
    let profile = tuning.difficulty(params.difficulty);
    let progression = params.progression;

    let unlocked = unlocked_category_count(progression, tuning);
    let mode = select_mode(progression, params.endless, tuning);
    let count = container_count(progression, mode, unlocked, tuning);

    // Sample categories without replacement.
    let mut pool: Vec<Category> = Category::ALL[..unlocked].to_vec();
    let mut containers = Vec::with_capacity(count);
    for i in 0..count {
        let pick = rng.next_range(pool.len() as u32) as usize;
        let category = pool.swap_remove(pick);
        let capacity = roll_capacity(progression, profile, tuning, &mut rng);
        containers.push(Container::new(ContainerId(i as u16), category, capacity));
    }

    let mut tokens = Vec::new();
    let mut next_id = 0u32;
    for container in &containers {
        for slot in 0..container.capacity {
            let mut token = Token::new(TokenId(next_id), container.category);
            next_id += 1;
            token.label = rng.next_range(tuning.labels_per_category.max(1) as u32) as u16;

            let rare = if mode == Mode::Boss {
                slot == 0
            } else {
                rng.chance(profile.rare_chance)
            };
            if rare {
                token.is_rare_variant = true;
            } else if rng.chance(profile.undiscovered_chance) {
                token.is_undiscovered = true;
                token.reveal = RevealState::Hidden;
            } else if rng.chance(profile.grimy_chance) {
                token.griminess = tuning.start_griminess;
            }
            tokens.push(token);
        }
    }

    if progression >= tuning.special_min_level {
        tag_specials(&mut tokens, tuning.special_pool_divisor, &mut rng);
    }

    for _ in 0..discard_count(progression, profile) {
        tokens.push(Token::discard(TokenId(next_id)));
        next_id += 1;
    }

    rng.shuffle(&mut tokens);

    let non_discard = tokens.iter().filter(|t| !t.is_discard).count();
    let budget = compute_budget(mode, progression, non_discard, tokens.len(), profile, tuning);

    tracing::debug!(
        progression,
        mode = mode.as_str(),
        containers = containers.len(),
        tokens = tokens.len(),
        "generated level"
    );

    Level {
        params,
        theme: theme_for(progression, mode),
        containers,
        tokens,
        budget,
    }
}

fn tag_specials(tokens: &mut [Token], divisor: u32, rng: &mut SimpleRng) {
    let eligible: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_rare_variant && !t.is_undiscovered)
        .map(|(i, _)| i)
        .collect();
    let target = eligible.len() / divisor.max(1) as usize;

    let mut tagged = 0;
    while tagged < target {
        let idx = eligible[rng.next_range(eligible.len() as u32) as usize];
        if tokens[idx].special.is_some() {
            continue;
        }
        let kind = SpecialEffect::KINDS[rng.next_range(SpecialEffect::KINDS.len() as u32) as usize];
        tokens[idx].special = kind;
        tagged += 1;
    }
}
