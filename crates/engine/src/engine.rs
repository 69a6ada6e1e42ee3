//! Engine - the command/event surface over one session at a time
//!
//! The engine owns the current [`Session`], the [`PlacementController`], the
//! injected [`TargetResolver`] and the [`ProfileStore`] collaborator. Every
//! command takes the caller's clock (`now_ms`); [`Engine::tick`] must be called
//! periodically so decay and budget timers fire without input.
//!
//! Events accumulate in order and are collected with [`Engine::drain_events`].

use tracing::{error, info};

use crate::core::{
    generate_level, mix_seed, EngineError, Level, LevelParams, MemoryProfile, ProfileStore, Result,
    Session, SessionSnapshot, Tuning,
};
use crate::placement::{ArmOutcome, CommitOutcome, PlacementController};
use crate::resolver::{MagneticResolver, TargetResolver};
use crate::types::{ContainerId, Difficulty, EngineEvent, PointerPos, Target, TokenId};

pub const DEFAULT_SEED: u32 = 0x5EED_C0DE;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tuning: Tuning,
    /// Defer win/loss checks until every fling animation has settled.
    pub await_fling_settle: bool,
    /// Base seed; each session mixes in its own counter.
    pub seed: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            await_fling_settle: false,
            seed: DEFAULT_SEED,
        }
    }
}

pub struct Engine {
    options: EngineOptions,
    profile: Box<dyn ProfileStore>,
    resolver: Box<dyn TargetResolver>,
    controller: PlacementController,
    session: Option<Session>,
    /// Pristine copy of the current level for restarts.
    initial_level: Option<Level>,
    sessions_started: u32,
    reported: bool,
    events: Vec<EngineEvent>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_parts(
            options,
            Box::new(MemoryProfile::default()),
            Box::new(MagneticResolver::default()),
        )
    }

    pub fn with_parts(
        options: EngineOptions,
        profile: Box<dyn ProfileStore>,
        resolver: Box<dyn TargetResolver>,
    ) -> Self {
        Self {
            options,
            profile,
            resolver,
            controller: PlacementController::new(),
            session: None,
            initial_level: None,
            sessions_started: 0,
            reported: false,
            events: Vec::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn controller(&self) -> &PlacementController {
        &self.controller
    }

    pub fn profile(&self) -> &dyn ProfileStore {
        self.profile.as_ref()
    }

    /// Swap the geometry strategy (layout changed, other presentation).
    pub fn set_resolver(&mut self, resolver: Box<dyn TargetResolver>) {
        self.resolver = resolver;
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(SessionSnapshot::from)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Generate and start a level. Returns the new session id.
    pub fn start_session(
        &mut self,
        progression: u32,
        difficulty: Difficulty,
        endless: bool,
        now_ms: u64,
    ) -> u32 {
        let seed = mix_seed(self.options.seed, self.sessions_started);
        let level = generate_level(
            LevelParams::new(progression, difficulty, endless, seed),
            &self.options.tuning,
        );
        self.start_level(level, now_ms)
    }

    /// Start a prepared level (handcrafted, replayed).
    pub fn start_level(&mut self, level: Level, now_ms: u64) -> u32 {
        self.teardown();
        self.sessions_started += 1;
        let id = self.sessions_started;
        self.initial_level = Some(level.clone());
        self.reported = false;
        self.session = Some(Session::new(
            id,
            level,
            self.options.tuning.clone(),
            now_ms,
            self.options.await_fling_settle,
        ));
        self.pump();
        id
    }

    /// Replay the current level from scratch (same seed, same dig pile).
    pub fn restart_session(&mut self, now_ms: u64) -> Result<u32> {
        let level = self.initial_level.clone().ok_or(EngineError::NoSession)?;
        info!(progression = level.params.progression, "session restarted");
        Ok(self.start_level(level, now_ms))
    }

    /// Cancel both timer families and any in-flight interaction.
    pub fn teardown(&mut self) {
        self.controller.cancel();
        if let Some(session) = self.session.as_mut() {
            session.teardown();
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(EngineError::NoSession)
    }

    pub fn arm_token(&mut self, token: TokenId, pos: PointerPos, now_ms: u64) -> Result<ArmOutcome> {
        let session = self.session.as_mut().ok_or(EngineError::NoSession)?;
        let outcome = self.controller.arm(session, token, now_ms);
        self.pump();
        let outcome = outcome.map_err(|e| self.log_violation(e))?;
        if let ArmOutcome::Armed { token, .. } = outcome {
            self.events.push(EngineEvent::TokenArmed { token_id: token });
            self.update_pointer(pos)?;
        }
        Ok(outcome)
    }

    /// Move sample while a token is armed. Returns the target when it changed.
    pub fn update_pointer(&mut self, pos: PointerPos) -> Result<Option<(Target, bool)>> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        let changed = self.controller.update_pointer(session, self.resolver.as_ref(), pos);
        if let Some((target, is_valid)) = changed {
            self.events.push(EngineEvent::TargetChanged { target, is_valid });
        }
        Ok(changed)
    }

    pub fn commit(&mut self, pos: PointerPos, now_ms: u64) -> Result<CommitOutcome> {
        let session = self.session.as_mut().ok_or(EngineError::NoSession)?;
        let outcome = self
            .controller
            .commit(session, self.resolver.as_ref(), pos, now_ms);
        self.pump();
        let outcome = outcome.map_err(|e| self.log_violation(e))?;
        match outcome {
            CommitOutcome::Cancelled { token } => {
                self.events.push(EngineEvent::TokenReturned { token_id: token });
            }
            CommitOutcome::Rejected { token, result, .. } if !result.removed => {
                self.events.push(EngineEvent::TokenReturned { token_id: token });
            }
            _ => {}
        }
        Ok(outcome)
    }

    pub fn use_hint(&mut self, now_ms: u64) -> Result<(TokenId, ContainerId)> {
        let level = self.profile.profile_level();
        let result = self.session_mut()?.use_hint(level, now_ms);
        self.pump();
        result
    }

    pub fn fling_settled(&mut self, token: TokenId, now_ms: u64) -> Result<()> {
        let result = self.session_mut()?.fling_settled(token, now_ms);
        self.pump();
        result
    }

    /// Scheduler tick. No-op without a live session.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(session) = self.session.as_mut() {
            session.tick(now_ms);
            self.pump();
        }
    }

    fn log_violation(&self, e: EngineError) -> EngineError {
        if e.is_contract_violation() {
            error!(code = e.code(), "{e}");
        }
        e
    }

    /// Collect session events; report to the profile once the session ends.
    fn pump(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.events.extend(session.drain_events());
        if session.is_over() && !self.reported {
            self.reported = true;
            self.controller.cancel();
            let report = session.report();
            self.profile.record_session(&report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Budget, Phase};
    use crate::types::{Category, Container, Mode, Token};

    fn engine() -> Engine {
        let resolver = MagneticResolver::new(100.0, 50.0)
            .with_container(ContainerId(0), PointerPos::new(0.0, 0.0))
            .with_container(ContainerId(1), PointerPos::new(300.0, 0.0))
            .with_discard(PointerPos::new(600.0, 0.0));
        Engine::with_parts(
            EngineOptions::default(),
            Box::new(MemoryProfile::new(1)),
            Box::new(resolver),
        )
    }

    fn level() -> Level {
        Level::handcrafted(
            vec![
                Container::new(ContainerId(0), Category::Rock, 1),
                Container::new(ContainerId(1), Category::Jazz, 1),
            ],
            vec![Token::new(TokenId(0), Category::Rock), Token::new(TokenId(1), Category::Jazz)],
            Budget::moves(Mode::Standard, 5),
        )
    }

    #[test]
    fn commands_need_a_session() {
        let mut e = engine();
        assert!(matches!(e.arm_token(TokenId(0), PointerPos::default(), 0), Err(EngineError::NoSession)));
        assert!(matches!(e.restart_session(0), Err(EngineError::NoSession)));
        e.tick(1_000);
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn event_order_for_a_placement() {
        let mut e = engine();
        e.start_level(level(), 0);
        e.arm_token(TokenId(0), PointerPos::new(0.0, 0.0), 10).unwrap();
        e.commit(PointerPos::new(0.0, 0.0), 20).unwrap();
        let events = e.drain_events();
        assert!(matches!(events[0], EngineEvent::SessionStarted { session_id: 1, .. }));
        assert_eq!(events[1], EngineEvent::TokenArmed { token_id: TokenId(0) });
        assert!(matches!(events[2], EngineEvent::TargetChanged { is_valid: true, .. }));
        assert!(matches!(events[3], EngineEvent::TokenAccepted { token_id: TokenId(0), slot: 0, .. }));
    }

    #[test]
    fn restart_replays_the_level_and_cancels_timers() {
        let mut e = engine();
        e.start_level(level(), 0);
        e.arm_token(TokenId(0), PointerPos::new(0.0, 0.0), 0).unwrap();
        e.commit(PointerPos::new(0.0, 0.0), 0).unwrap();
        assert!(e.session().unwrap().combo().window_deadline().is_some());

        let id = e.restart_session(100).unwrap();
        assert_eq!(id, 2);
        let s = e.session().unwrap();
        assert_eq!(s.combo().streak(), 0);
        assert_eq!(s.container(ContainerId(0)).unwrap().filled, 0);
        assert_eq!(s.tokens_in_play().count(), 2);

        e.drain_events();
        e.tick(100 + 10_000);
        assert!(!e.drain_events().contains(&EngineEvent::ComboDecayed));
    }

    #[test]
    fn win_is_reported_once() {
        let mut e = engine();
        e.start_level(level(), 0);
        e.arm_token(TokenId(0), PointerPos::new(0.0, 0.0), 0).unwrap();
        e.commit(PointerPos::new(0.0, 0.0), 0).unwrap();
        e.arm_token(TokenId(1), PointerPos::new(300.0, 0.0), 0).unwrap();
        e.commit(PointerPos::new(300.0, 0.0), 0).unwrap();
        assert_eq!(e.session().unwrap().phase(), Phase::Won);
        assert!(e
            .drain_events()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::SessionWon { .. })));
        e.tick(50_000);
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn generated_sessions_differ_by_counter_but_restart_does_not() {
        let mut e = engine();
        e.start_session(3, Difficulty::Normal, false, 0);
        let first = e.session().unwrap().level().clone();
        e.restart_session(0).unwrap();
        assert_eq!(e.session().unwrap().level(), &first);
    }
}
