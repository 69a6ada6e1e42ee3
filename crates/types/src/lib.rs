//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data (serde-serializable for the adapter protocol), usable in
//! any context: rules, placement, terminal input, JSON adapter.
//!
//! # Tokens and containers
//!
//! - A [`Token`] is one record on the dig pile. It belongs to a [`Category`] and may carry a
//!   [`SpecialEffect`], a rare-variant flag, a hidden label or grime.
//! - A [`Container`] is a crate on the shelf: fixed category, fixed capacity, fill count that
//!   only ever grows.
//! - Discard tokens belong in the discard bin, never in a crate.
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DECAY_WINDOW_MS` | 4500 | Combo window rearmed on every accept |
//! | `BUDGET_TICK_MS` | 1000 | Recurring countdown tick in timed modes |
//!
//! # Multiplier Tiers
//!
//! | Streak | Tier |
//! |--------|------|
//! | 0-1 | 1x |
//! | 2-4 | 2x |
//! | 5-9 | 3x |
//! | 10-14 | 5x |
//! | 15+ | 10x |
//!
//! # Examples
//!
//! ```
//! use crate_digger_types::{Category, MultiplierTier, Mode};
//!
//! assert_eq!(Category::from_str("jazz"), Some(Category::Jazz));
//! assert_eq!(MultiplierTier::from_streak(6), MultiplierTier::X3);
//! assert!(Mode::Timed.binds_time());
//! assert!(!Mode::Timed.binds_moves());
//! ```

pub mod event;

pub use event::{EngineEvent, LossReason, SessionStats};

use serde::{Deserialize, Serialize};

/// Combo decay window in milliseconds (reference tuning).
pub const DECAY_WINDOW_MS: u64 = 4500;

/// Countdown tick interval for time-bound modes.
pub const BUDGET_TICK_MS: u64 = 1000;

/// Starting griminess of a grimy record.
pub const MAX_GRIMINESS: u8 = 3;

/// Moves refunded when a rare variant is accepted in a move-bound mode.
pub const RARE_MOVE_REFUND: i32 = 3;

/// Sentinel for "moves do not bind in this mode".
pub const UNLIMITED_MOVES: i32 = i32::MAX;

/// Sentinel for "time does not bind in this mode".
pub const UNLIMITED_SECONDS: u32 = u32::MAX;

/// Stable id of a token within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u32);

/// Stable id of a container within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u16);

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "crate#{}", self.0)
    }
}

/// Record genres, in unlock order.
///
/// Earlier unlocks are always a prefix of later ones, so the set available at a
/// lower progression index is a strict subset of the set at a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Rock,
    Jazz,
    HipHop,
    Electronic,
    Soul,
    Classical,
    Reggae,
    Punk,
    Blues,
    Funk,
    Country,
    Metal,
}

impl Category {
    /// All categories in unlock order.
    pub const ALL: [Category; 12] = [
        Category::Rock,
        Category::Jazz,
        Category::HipHop,
        Category::Electronic,
        Category::Soul,
        Category::Classical,
        Category::Reggae,
        Category::Punk,
        Category::Blues,
        Category::Funk,
        Category::Country,
        Category::Metal,
    ];

    /// Parse a category from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use crate_digger_types::Category;
    ///
    /// assert_eq!(Category::from_str("ROCK"), Some(Category::Rock));
    /// assert_eq!(Category::from_str("hip_hop"), Some(Category::HipHop));
    /// assert_eq!(Category::from_str("polka"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lower)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Rock => "rock",
            Category::Jazz => "jazz",
            Category::HipHop => "hip_hop",
            Category::Electronic => "electronic",
            Category::Soul => "soul",
            Category::Classical => "classical",
            Category::Reggae => "reggae",
            Category::Punk => "punk",
            Category::Blues => "blues",
            Category::Funk => "funk",
            Category::Country => "country",
            Category::Metal => "metal",
        }
    }
}

/// Special effect carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialEffect {
    #[default]
    None,
    /// Triples the placement score and adds a flat bonus.
    ScoreMultiplier,
    /// Fits any category crate.
    Wildcard,
    /// Extra move penalty when rejected.
    Penalty,
    /// Flat bonus when the previous accepted record shares the category.
    Chain,
    /// Extends the clock in timed modes.
    ResourceBonus,
}

impl SpecialEffect {
    /// The five assignable effects, drawn uniformly by the generator.
    pub const KINDS: [SpecialEffect; 5] = [
        SpecialEffect::ScoreMultiplier,
        SpecialEffect::Wildcard,
        SpecialEffect::Penalty,
        SpecialEffect::Chain,
        SpecialEffect::ResourceBonus,
    ];

    pub fn is_some(&self) -> bool {
        !matches!(self, SpecialEffect::None)
    }
}

/// Reveal state of an undiscovered record. Flips once, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    #[default]
    Shown,
    Hidden,
    Revealed,
}

/// A record on the dig pile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub category: Category,
    pub special: SpecialEffect,
    pub is_rare_variant: bool,
    pub is_undiscovered: bool,
    pub reveal: RevealState,
    pub griminess: u8,
    pub is_discard: bool,
    /// Catalog label within the category; used by the collection to dedup rare finds.
    pub label: u16,
}

impl Token {
    /// A plain record of the given category.
    pub fn new(id: TokenId, category: Category) -> Self {
        Self {
            id,
            category,
            special: SpecialEffect::None,
            is_rare_variant: false,
            is_undiscovered: false,
            reveal: RevealState::Shown,
            griminess: 0,
            is_discard: false,
            label: 0,
        }
    }

    /// A discard token. Its category is irrelevant to placement.
    pub fn discard(id: TokenId) -> Self {
        Self {
            is_discard: true,
            ..Self::new(id, Category::Rock)
        }
    }

    /// Only clean records can be picked up.
    pub fn is_manipulable(&self) -> bool {
        self.griminess == 0
    }

    pub fn is_grimy(&self) -> bool {
        self.griminess > 0
    }

    /// Whether this record would be accepted by a crate of `category`, ignoring capacity.
    pub fn matches_category(&self, category: Category) -> bool {
        !self.is_discard
            && (self.category == category || self.special == SpecialEffect::Wildcard)
    }
}

/// A crate on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub category: Category,
    pub capacity: u8,
    pub filled: u8,
}

impl Container {
    pub fn new(id: ContainerId, category: Category, capacity: u8) -> Self {
        Self {
            id,
            category,
            capacity,
            filled: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.filled >= self.capacity
    }

    pub fn remaining(&self) -> u8 {
        self.capacity.saturating_sub(self.filled)
    }
}

/// Session mode. Selected by the generator from the progression index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Standard,
    Timed,
    /// One mistake ends the session.
    HardFail,
    Boss,
    Endless,
}

impl Mode {
    /// Whether the move counter is a losing constraint.
    pub fn binds_moves(&self) -> bool {
        matches!(self, Mode::Standard | Mode::HardFail | Mode::Endless)
    }

    /// Whether the countdown clock is a losing constraint.
    pub fn binds_time(&self) -> bool {
        matches!(self, Mode::Timed | Mode::Boss | Mode::Endless)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Timed => "timed",
            Mode::HardFail => "hard_fail",
            Mode::Boss => "boss",
            Mode::Endless => "endless",
        }
    }
}

/// Player-selected difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Parse difficulty from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use crate_digger_types::Difficulty;
    ///
    /// assert_eq!(Difficulty::from_str("Hard"), Some(Difficulty::Hard));
    /// assert_eq!(Difficulty::from_str("nightmare"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Visual theme tag handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Basement,
    Garage,
    Flea,
    Shop,
    Loft,
    Vault,
}

impl Theme {
    /// Themes cycled through by regular levels.
    pub const ROTATION: [Theme; 5] = [
        Theme::Basement,
        Theme::Garage,
        Theme::Flea,
        Theme::Shop,
        Theme::Loft,
    ];
}

/// Score multiplier tier, a step function of the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum MultiplierTier {
    #[default]
    X1,
    X2,
    X3,
    X5,
    X10,
}

impl MultiplierTier {
    /// Map a streak to its tier.
    ///
    /// # Examples
    ///
    /// ```
    /// use crate_digger_types::MultiplierTier;
    ///
    /// assert_eq!(MultiplierTier::from_streak(0), MultiplierTier::X1);
    /// assert_eq!(MultiplierTier::from_streak(2), MultiplierTier::X2);
    /// assert_eq!(MultiplierTier::from_streak(14), MultiplierTier::X5);
    /// assert_eq!(MultiplierTier::from_streak(15), MultiplierTier::X10);
    /// ```
    pub fn from_streak(streak: u32) -> Self {
        match streak {
            0..=1 => MultiplierTier::X1,
            2..=4 => MultiplierTier::X2,
            5..=9 => MultiplierTier::X3,
            10..=14 => MultiplierTier::X5,
            _ => MultiplierTier::X10,
        }
    }

    pub fn factor(&self) -> u32 {
        match self {
            MultiplierTier::X1 => 1,
            MultiplierTier::X2 => 2,
            MultiplierTier::X3 => 3,
            MultiplierTier::X5 => 5,
            MultiplierTier::X10 => 10,
        }
    }
}

/// Why a commit was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    WrongCategory,
    Full,
    /// A discard token dropped on a crate, or a record dropped in the discard bin.
    WrongBin,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::WrongCategory => "wrong-category",
            RejectReason::Full => "full",
            RejectReason::WrongBin => "wrong-bin",
        }
    }
}

/// Current drop target of an armed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Target {
    #[default]
    None,
    Container(ContainerId),
    Discard,
}

/// Pointer position in presentation space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PointerPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_is_monotone_step_function() {
        let mut prev = MultiplierTier::X1;
        for streak in 0..40 {
            let tier = MultiplierTier::from_streak(streak);
            assert!(tier >= prev, "tier dropped at streak {}", streak);
            prev = tier;
        }
        assert_eq!(MultiplierTier::from_streak(1).factor(), 1);
        assert_eq!(MultiplierTier::from_streak(4).factor(), 2);
        assert_eq!(MultiplierTier::from_streak(9).factor(), 3);
        assert_eq!(MultiplierTier::from_streak(100).factor(), 10);
    }

    #[test]
    fn wildcard_matches_any_category_but_discard_matches_none() {
        let mut token = Token::new(TokenId(1), Category::Jazz);
        assert!(token.matches_category(Category::Jazz));
        assert!(!token.matches_category(Category::Rock));

        token.special = SpecialEffect::Wildcard;
        assert!(token.matches_category(Category::Rock));

        let discard = Token::discard(TokenId(2));
        assert!(!discard.matches_category(discard.category));
    }

    #[test]
    fn mode_binding_resources() {
        assert!(Mode::Standard.binds_moves() && !Mode::Standard.binds_time());
        assert!(Mode::HardFail.binds_moves());
        assert!(Mode::Boss.binds_time() && !Mode::Boss.binds_moves());
        assert!(Mode::Endless.binds_moves() && Mode::Endless.binds_time());
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(Category::from_str(c.as_str()), Some(c));
        }
    }
}
