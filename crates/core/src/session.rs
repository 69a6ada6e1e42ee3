//! Session state module - one level being played
//!
//! Ties together the generated level, the budget, the combo state machine, the
//! two timer families, the session counters and the objective tracker. All
//! authoritative state changes synchronously here; fling animations are only a
//! visual tail tracked by the set of tokens still in flight.
//!
//! Clock values are caller-supplied milliseconds (`now_ms`), so the same inputs
//! always replay the same session.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Tuning;
use crate::counters::SessionCounters;
use crate::error::{EngineError, Result};
use crate::generator::{Budget, Level};
use crate::objectives::ObjectiveTracker;
use crate::profile::SessionReport;
use crate::scoring::{
    accept_move_cost, calculate_placement, reject_move_cost, star_rating, ComboState, ScoreResult,
};
use crate::timers::CountdownTimer;
use crate::types::{
    Category, Container, ContainerId, EngineEvent, LossReason, Mode, MultiplierTier, RejectReason,
    RevealState, SessionStats, Target, Token, TokenId, BUDGET_TICK_MS,
};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "reason")]
pub enum Phase {
    Playing,
    Won,
    Lost(LossReason),
}

/// Result of a valid accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub slot: u8,
    pub score: ScoreResult,
    pub streak: u32,
    pub tier: MultiplierTier,
}

/// Result of a reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    pub reason: RejectReason,
    /// The token left play (discard dropped on a crate).
    pub removed: bool,
    pub move_cost: i32,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: u32,
    tuning: Tuning,
    level: Level,
    index: HashMap<TokenId, usize>,
    resolved: Vec<bool>,
    budget: Budget,
    combo: ComboState,
    countdown: CountdownTimer,
    counters: SessionCounters,
    objectives: ObjectiveTracker,
    phase: Phase,
    started_at: u64,
    last_category: Option<Category>,
    await_fling_settle: bool,
    in_flight: BTreeSet<TokenId>,
    collected: Vec<(Category, u16)>,
    events: Vec<EngineEvent>,
}

impl Session {
    pub fn new(id: u32, level: Level, tuning: Tuning, now_ms: u64, await_fling_settle: bool) -> Self {
        let index = level
            .tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i))
            .collect();
        let counters = SessionCounters {
            grimy_total: level.tokens.iter().filter(|t| t.is_grimy()).count() as u32,
            discards_total: level.tokens.iter().filter(|t| t.is_discard).count() as u32,
            ..Default::default()
        };
        let objectives =
            ObjectiveTracker::generate(level.params.progression, level.mode(), &tuning);

        let mut countdown = CountdownTimer::new(BUDGET_TICK_MS);
        if level.budget.time_binds() {
            countdown.start(now_ms);
        }

        info!(
            session_id = id,
            progression = level.params.progression,
            mode = level.mode().as_str(),
            tokens = level.tokens.len(),
            "session started"
        );

        let resolved = vec![false; level.tokens.len()];
        let budget = level.budget;
        let progression = level.params.progression;
        Self {
            id,
            tuning,
            level,
            index,
            resolved,
            budget,
            combo: ComboState::new(),
            countdown,
            counters,
            objectives,
            phase: Phase::Playing,
            started_at: now_ms,
            last_category: None,
            await_fling_settle,
            in_flight: BTreeSet::new(),
            collected: Vec::new(),
            events: vec![EngineEvent::SessionStarted {
                session_id: id,
                progression,
            }],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn mode(&self) -> Mode {
        self.level.mode()
    }

    pub fn containers(&self) -> &[Container] {
        &self.level.containers
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.level.containers.iter().find(|c| c.id == id)
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.index.get(&id).map(|&i| &self.level.tokens[i])
    }

    pub fn is_resolved(&self, id: TokenId) -> bool {
        self.index.get(&id).map(|&i| self.resolved[i]).unwrap_or(false)
    }

    /// Unresolved tokens in placement order.
    pub fn tokens_in_play(&self) -> impl Iterator<Item = &Token> + '_ {
        self.level
            .tokens
            .iter()
            .zip(self.resolved.iter())
            .filter(|(_, r)| !**r)
            .map(|(t, _)| t)
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn score(&self) -> u64 {
        self.counters.score
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase != Phase::Playing
    }

    pub fn pending_flings(&self) -> u32 {
        self.in_flight.len() as u32
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn index_of(&self, id: TokenId) -> Result<usize> {
        let idx = *self.index.get(&id).ok_or(EngineError::UnknownToken(id))?;
        if self.resolved[idx] {
            error!(token = %id, "mutation of a resolved token");
            return Err(EngineError::TokenResolved(id));
        }
        Ok(idx)
    }

    fn ensure_playing(&self) -> Result<()> {
        if self.is_over() {
            return Err(EngineError::SessionOver);
        }
        Ok(())
    }

    /// Check a token is live and unresolved.
    pub fn check_token(&self, id: TokenId) -> Result<&Token> {
        self.ensure_playing()?;
        let idx = self.index_of(id)?;
        Ok(&self.level.tokens[idx])
    }

    /// Scrub one layer of grime. Returns the remaining griminess.
    pub fn clean(&mut self, id: TokenId, now_ms: u64) -> Result<u8> {
        self.ensure_playing()?;
        let idx = self.index_of(id)?;
        let token = &mut self.level.tokens[idx];
        if token.griminess == 0 {
            return Ok(0);
        }
        token.griminess -= 1;
        let remaining = token.griminess;
        if remaining == 0 {
            self.counters.grimy_cleaned += 1;
        }
        self.events.push(EngineEvent::TokenCleaned {
            token_id: id,
            griminess: remaining,
        });
        self.touch(now_ms);
        Ok(remaining)
    }

    /// Flip an undiscovered record face up. One-way.
    pub fn reveal(&mut self, id: TokenId) -> Result<bool> {
        self.ensure_playing()?;
        let idx = self.index_of(id)?;
        let token = &mut self.level.tokens[idx];
        if token.reveal != RevealState::Hidden {
            return Ok(false);
        }
        token.reveal = RevealState::Revealed;
        self.events.push(EngineEvent::TokenRevealed { token_id: id });
        Ok(true)
    }

    /// Accept path for a committed valid placement.
    pub fn accept(&mut self, id: TokenId, target: Target, now_ms: u64) -> Result<Accepted> {
        self.ensure_playing()?;
        let idx = self.index_of(id)?;
        if !self.level.tokens[idx].is_manipulable() {
            return Err(EngineError::TokenGrimy(id));
        }

        let slot = match target {
            Target::Container(cid) => {
                let container = self
                    .level
                    .containers
                    .iter_mut()
                    .find(|c| c.id == cid)
                    .ok_or(EngineError::UnknownContainer(cid))?;
                if container.is_full() {
                    error!(container = %cid, token = %id, "accept into a full container");
                    return Err(EngineError::ContainerFull(cid));
                }
                let slot = container.filled;
                container.filled += 1;
                slot
            }
            Target::Discard => self.counters.discards_binned.min(u8::MAX as u32) as u8,
            Target::None => return Err(EngineError::NoTarget),
        };
        self.resolved[idx] = true;

        let token = self.level.tokens[idx].clone();
        self.combo.on_accept(now_ms, self.tuning.decay_window_ms);
        let score = calculate_placement(
            &token,
            self.combo.streak(),
            self.combo.tier(),
            self.last_category,
            &self.budget,
            &self.tuning,
        );

        let cost = accept_move_cost(&token, &self.budget, &self.tuning);
        self.budget.spend_moves(cost);
        if self.budget.moves_bind() && cost > 0 {
            self.counters.moves_used += cost as u32;
        }
        if score.bonus_seconds > 0 {
            self.budget.time_remaining = self.budget.time_remaining.saturating_add(score.bonus_seconds);
        }

        self.counters.score += score.total;
        if token.is_discard {
            self.counters.discards_binned += 1;
            self.last_category = None;
        } else {
            self.counters.sorted += 1;
            self.last_category = Some(token.category);
        }
        if token.is_rare_variant {
            self.counters.rare_sorted += 1;
            self.collected.push((token.category, token.label));
        }
        if token.special.is_some() {
            self.counters.specials_triggered += 1;
        }

        if self.await_fling_settle {
            self.in_flight.insert(id);
        }

        debug!(token = %id, points = score.total, streak = self.combo.streak(), "accepted");
        self.events.push(EngineEvent::TokenAccepted {
            token_id: id,
            target,
            slot,
            points_awarded: score.total,
            new_streak: self.combo.streak(),
            tier: self.combo.tier(),
        });
        self.touch(now_ms);
        self.check_end(now_ms);

        Ok(Accepted {
            slot,
            score,
            streak: self.combo.streak(),
            tier: self.combo.tier(),
        })
    }

    /// Reject path for a committed invalid placement.
    pub fn reject(&mut self, id: TokenId, reason: RejectReason, now_ms: u64) -> Result<Rejected> {
        self.ensure_playing()?;
        let idx = self.index_of(id)?;
        let token = &self.level.tokens[idx];

        let wrong_bin = reason == RejectReason::WrongBin;
        let removed = wrong_bin && token.is_discard;
        let move_cost = reject_move_cost(token, wrong_bin, &self.tuning);

        self.combo.break_streak();
        self.budget.spend_moves(move_cost);
        if self.budget.moves_bind() {
            self.counters.moves_used += move_cost.max(0) as u32;
        }
        self.counters.mistakes += 1;
        if removed {
            self.resolved[idx] = true;
        }

        debug!(token = %id, reason = reason.as_str(), removed, "rejected");
        self.events.push(EngineEvent::TokenRejected {
            token_id: id,
            reason,
            removed,
        });
        self.touch(now_ms);

        if self.mode() == Mode::HardFail {
            self.lose(LossReason::Mistake);
        } else {
            self.check_end(now_ms);
        }

        Ok(Rejected {
            reason,
            removed,
            move_cost,
        })
    }

    /// First manipulable, unresolved non-discard record whose crate still has room.
    pub fn hint_candidate(&self) -> Option<(TokenId, ContainerId)> {
        self.tokens_in_play()
            .filter(|t| !t.is_discard && t.is_manipulable())
            .find_map(|t| {
                self.level
                    .containers
                    .iter()
                    .find(|c| !c.is_full() && t.matches_category(c.category))
                    .map(|c| (t.id, c.id))
            })
    }

    /// Spend a hint. Gated by the player's profile level.
    pub fn use_hint(&mut self, profile_level: u32, now_ms: u64) -> Result<(TokenId, ContainerId)> {
        self.ensure_playing()?;
        if profile_level < self.tuning.hint_min_profile_level {
            return Err(EngineError::HintUnavailable);
        }
        let (token_id, container_id) = self.hint_candidate().ok_or(EngineError::HintUnavailable)?;

        let cost = self.tuning.hint_move_cost;
        self.budget.spend_moves(cost);
        if self.budget.moves_bind() {
            self.counters.moves_used += cost.max(0) as u32;
        }
        self.counters.hints_used += 1;
        self.events.push(EngineEvent::HintRevealed {
            token_id,
            container_id,
        });
        self.touch(now_ms);
        self.check_end(now_ms);
        Ok((token_id, container_id))
    }

    /// A fling animation landed. Deferred end checks run once none are pending.
    ///
    /// Only tokens accepted while awaiting settles can land, and each lands once.
    pub fn fling_settled(&mut self, id: TokenId, now_ms: u64) -> Result<()> {
        if !self.in_flight.remove(&id) {
            return Err(EngineError::NotInFlight(id));
        }
        if !self.is_over() {
            self.check_end(now_ms);
        }
        Ok(())
    }

    /// Scheduler tick: combo decay and the budget countdown. Fires without input.
    pub fn tick(&mut self, now_ms: u64) {
        if self.is_over() {
            return;
        }
        if self.combo.decay(now_ms) {
            debug!(session_id = self.id, "combo decayed");
            self.events.push(EngineEvent::ComboDecayed);
        }

        for _ in 0..self.countdown.due_ticks(now_ms) {
            self.budget.time_remaining = self.budget.time_remaining.saturating_sub(1);
            self.events.push(EngineEvent::TimeTick {
                time_remaining: self.budget.time_remaining,
            });
            if self.budget.time_remaining == 0 {
                self.lose(LossReason::OutOfTime);
                return;
            }
        }
        self.touch(now_ms);
    }

    /// Cancel both timer families. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.combo.break_streak();
        self.countdown.cancel();
    }

    fn touch(&mut self, now_ms: u64) {
        self.counters.elapsed_ms = now_ms.saturating_sub(self.started_at);
        self.counters.streak = self.combo.streak();
        self.counters.max_streak = self.combo.max_streak();
        for o in self.objectives.update(&self.counters) {
            self.events.push(EngineEvent::ObjectiveCompleted {
                objective_id: o.id,
                bonus_reward: o.bonus_reward,
            });
        }
    }

    fn check_end(&mut self, now_ms: u64) {
        if self.is_over() || !self.in_flight.is_empty() {
            return;
        }
        if self.level.containers.iter().all(Container::is_full) {
            self.win(now_ms);
        } else if self.budget.moves_bind()
            && self.mode() != Mode::HardFail
            && self.budget.moves_remaining <= 0
        {
            self.lose(LossReason::OutOfMoves);
        }
    }

    fn win(&mut self, now_ms: u64) {
        self.phase = Phase::Won;
        self.counters.won = true;
        let max_streak = self.combo.max_streak();
        let stars = star_rating(
            self.counters.mistakes,
            max_streak,
            self.budget.remaining_ratio(),
            &self.tuning,
        );
        self.touch(now_ms);
        self.teardown();

        let stats = SessionStats {
            score: self.counters.score,
            stars,
            max_streak,
            mistakes: self.counters.mistakes,
            moves_remaining: self.budget.moves_remaining,
            time_remaining: self.budget.time_remaining,
            elapsed_ms: self.counters.elapsed_ms,
        };
        info!(session_id = self.id, score = stats.score, stars, "session won");
        self.events.push(EngineEvent::SessionWon { stats });
    }

    fn lose(&mut self, reason: LossReason) {
        self.phase = Phase::Lost(reason);
        self.teardown();
        info!(session_id = self.id, ?reason, "session lost");
        self.events.push(EngineEvent::SessionLost { reason });
    }

    /// End-of-session summary for the profile collaborator.
    pub fn report(&self) -> SessionReport {
        let (won, loss_reason) = match self.phase {
            Phase::Won => (true, None),
            Phase::Lost(r) => (false, Some(r)),
            Phase::Playing => (false, None),
        };
        let stars = if won {
            star_rating(
                self.counters.mistakes,
                self.combo.max_streak(),
                self.budget.remaining_ratio(),
                &self.tuning,
            )
        } else {
            0
        };
        SessionReport {
            progression: self.level.params.progression,
            mode: self.mode(),
            won,
            loss_reason,
            score: self.counters.score,
            stars,
            max_streak: self.combo.max_streak(),
            mistakes: self.counters.mistakes,
            elapsed_ms: self.counters.elapsed_ms,
            sorted: self.counters.sorted,
            objective_bonus: self.objectives.total_bonus(),
            collected: self.collected.clone(),
        }
    }
}
