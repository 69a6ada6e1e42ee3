//! Placement controller - one in-flight interaction at a time
//!
//! `Idle -> Armed(token) -> Targeting(target) -> {Committed | Cancelled} -> Idle`
//!
//! The controller owns only the interaction state. Authoritative mutations go
//! through the [`Session`] accept and reject paths at commit time, so the pointer
//! stream itself can never change score, combo or budget.

use tracing::debug;

use crate::core::{Accepted, Rejected, Result, Session};
use crate::resolver::TargetResolver;
use crate::types::{PointerPos, RejectReason, RevealState, Target, Token, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementState {
    #[default]
    Idle,
    Armed {
        token: TokenId,
    },
    Targeting {
        token: TokenId,
        target: Target,
        valid: bool,
    },
}

/// Outcome of a down-event on a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Armed { token: TokenId, revealed: bool },
    /// Grimy token scrubbed instead of armed.
    Cleaned { token: TokenId, remaining: u8 },
    /// Another token is already armed; first arm wins.
    Ignored,
}

/// Outcome of an up-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Accepted { token: TokenId, target: Target, result: Accepted },
    Rejected { token: TokenId, target: Target, result: Rejected },
    /// Released over no target; the token goes back to rest.
    Cancelled { token: TokenId },
    NotArmed,
}

/// Validity of a target for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(RejectReason),
    NoTarget,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }
}

/// Whether `token` may land on `target` in the current session.
pub fn evaluate(session: &Session, token: &Token, target: Target) -> Validity {
    match target {
        Target::None => Validity::NoTarget,
        Target::Discard if token.is_discard => Validity::Valid,
        Target::Discard => Validity::Invalid(RejectReason::WrongBin),
        Target::Container(_) if token.is_discard => Validity::Invalid(RejectReason::WrongBin),
        Target::Container(id) => match session.container(id) {
            None => Validity::NoTarget,
            Some(c) if !token.matches_category(c.category) => {
                Validity::Invalid(RejectReason::WrongCategory)
            }
            Some(c) if c.is_full() => Validity::Invalid(RejectReason::Full),
            Some(_) => Validity::Valid,
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlacementController {
    state: PlacementState,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    pub fn armed_token(&self) -> Option<TokenId> {
        match self.state {
            PlacementState::Idle => None,
            PlacementState::Armed { token } | PlacementState::Targeting { token, .. } => Some(token),
        }
    }

    /// Current target and its validity while targeting.
    pub fn target(&self) -> Option<(Target, bool)> {
        match self.state {
            PlacementState::Targeting { target, valid, .. } => Some((target, valid)),
            _ => None,
        }
    }

    /// Down-event on `token_id`. Grimy tokens are cleaned, hidden ones revealed.
    pub fn arm(&mut self, session: &mut Session, token_id: TokenId, now_ms: u64) -> Result<ArmOutcome> {
        if self.state != PlacementState::Idle {
            debug!(token = %token_id, "arm ignored, another token is armed");
            return Ok(ArmOutcome::Ignored);
        }

        let token = session.check_token(token_id)?;
        if token.is_grimy() {
            let remaining = session.clean(token_id, now_ms)?;
            return Ok(ArmOutcome::Cleaned {
                token: token_id,
                remaining,
            });
        }

        let revealed = if token.reveal == RevealState::Hidden && !token.is_discard {
            session.reveal(token_id)?
        } else {
            false
        };

        self.state = PlacementState::Armed { token: token_id };
        Ok(ArmOutcome::Armed {
            token: token_id,
            revealed,
        })
    }

    /// Move sample. Returns the new `(target, valid)` when it changed.
    pub fn update_pointer(
        &mut self,
        session: &Session,
        resolver: &dyn TargetResolver,
        pos: PointerPos,
    ) -> Option<(Target, bool)> {
        let (token, previous) = match self.state {
            PlacementState::Idle => return None,
            PlacementState::Armed { token } => (token, None),
            PlacementState::Targeting { token, target, valid } => (token, Some((target, valid))),
        };

        let target = resolver.resolve(pos);
        let valid = session
            .token(token)
            .map(|t| evaluate(session, t, target).is_valid())
            .unwrap_or(false);

        self.state = PlacementState::Targeting { token, target, valid };
        if previous == Some((target, valid)) {
            None
        } else {
            Some((target, valid))
        }
    }

    /// Up-event. The final target is resolved from the release position.
    pub fn commit(
        &mut self,
        session: &mut Session,
        resolver: &dyn TargetResolver,
        pos: PointerPos,
        now_ms: u64,
    ) -> Result<CommitOutcome> {
        let Some(token_id) = self.armed_token() else {
            return Ok(CommitOutcome::NotArmed);
        };
        self.state = PlacementState::Idle;

        let target = resolver.resolve(pos);
        let token = session.check_token(token_id)?.clone();
        match evaluate(session, &token, target) {
            Validity::Valid => {
                let result = session.accept(token_id, target, now_ms)?;
                Ok(CommitOutcome::Accepted {
                    token: token_id,
                    target,
                    result,
                })
            }
            Validity::Invalid(reason) => {
                let result = session.reject(token_id, reason, now_ms)?;
                Ok(CommitOutcome::Rejected {
                    token: token_id,
                    target,
                    result,
                })
            }
            Validity::NoTarget => Ok(CommitOutcome::Cancelled { token: token_id }),
        }
    }

    /// Drop any in-flight interaction without touching the session.
    pub fn cancel(&mut self) -> Option<TokenId> {
        let token = self.armed_token();
        self.state = PlacementState::Idle;
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Budget, Level, Tuning};
    use crate::resolver::MagneticResolver;
    use crate::types::{Category, Container, ContainerId, Mode, SpecialEffect};

    fn session() -> Session {
        let containers = vec![
            Container::new(ContainerId(0), Category::Rock, 1),
            Container::new(ContainerId(1), Category::Jazz, 2),
        ];
        let mut tokens = vec![
            Token::new(TokenId(0), Category::Rock),
            Token::new(TokenId(1), Category::Jazz),
            Token::new(TokenId(2), Category::Jazz),
            Token::discard(TokenId(3)),
        ];
        tokens[2].special = SpecialEffect::Wildcard;
        let level = Level::handcrafted(containers, tokens, Budget::moves(Mode::Standard, 20));
        Session::new(1, level, Tuning::default(), 0, false)
    }

    fn resolver() -> MagneticResolver {
        MagneticResolver::new(100.0, 50.0)
            .with_container(ContainerId(0), PointerPos::new(0.0, 0.0))
            .with_container(ContainerId(1), PointerPos::new(300.0, 0.0))
            .with_discard(PointerPos::new(600.0, 0.0))
    }

    const ROCK: PointerPos = PointerPos { x: 0.0, y: 0.0 };
    const JAZZ: PointerPos = PointerPos { x: 300.0, y: 0.0 };
    const BIN: PointerPos = PointerPos { x: 600.0, y: 0.0 };
    const NOWHERE: PointerPos = PointerPos { x: 450.0, y: 500.0 };

    #[test]
    fn validity_rules() {
        let s = session();
        let rock = s.token(TokenId(0)).unwrap();
        let wild = s.token(TokenId(2)).unwrap();
        let trash = s.token(TokenId(3)).unwrap();
        let c0 = Target::Container(ContainerId(0));
        let c1 = Target::Container(ContainerId(1));

        assert_eq!(evaluate(&s, rock, Target::None), Validity::NoTarget);
        assert_eq!(evaluate(&s, rock, c0), Validity::Valid);
        assert_eq!(evaluate(&s, rock, c1), Validity::Invalid(RejectReason::WrongCategory));
        assert_eq!(evaluate(&s, rock, Target::Discard), Validity::Invalid(RejectReason::WrongBin));
        assert_eq!(evaluate(&s, wild, c0), Validity::Valid);
        assert_eq!(evaluate(&s, trash, c1), Validity::Invalid(RejectReason::WrongBin));
        assert_eq!(evaluate(&s, trash, Target::Discard), Validity::Valid);
    }

    #[test]
    fn first_arm_wins() {
        let mut s = session();
        let mut pc = PlacementController::new();
        assert!(matches!(pc.arm(&mut s, TokenId(0), 0).unwrap(), ArmOutcome::Armed { .. }));
        assert_eq!(pc.arm(&mut s, TokenId(1), 0).unwrap(), ArmOutcome::Ignored);
        assert_eq!(pc.armed_token(), Some(TokenId(0)));
    }

    #[test]
    fn targeting_reports_changes_only() {
        let mut s = session();
        let r = resolver();
        let mut pc = PlacementController::new();
        pc.arm(&mut s, TokenId(0), 0).unwrap();

        assert_eq!(pc.update_pointer(&s, &r, ROCK), Some((Target::Container(ContainerId(0)), true)));
        assert_eq!(pc.update_pointer(&s, &r, PointerPos::new(5.0, 5.0)), None);
        assert_eq!(pc.update_pointer(&s, &r, JAZZ), Some((Target::Container(ContainerId(1)), false)));
        assert_eq!(pc.update_pointer(&s, &r, NOWHERE), Some((Target::None, false)));
    }

    #[test]
    fn cancel_leaves_session_untouched() {
        let mut s = session();
        let r = resolver();
        let mut pc = PlacementController::new();
        let before = s.counters();
        let budget = *s.budget();

        pc.arm(&mut s, TokenId(0), 0).unwrap();
        pc.update_pointer(&s, &r, ROCK);
        let out = pc.commit(&mut s, &r, NOWHERE, 10).unwrap();
        assert_eq!(out, CommitOutcome::Cancelled { token: TokenId(0) });
        assert_eq!(pc.state(), PlacementState::Idle);
        assert_eq!(s.counters(), before);
        assert_eq!(*s.budget(), budget);
        assert_eq!(s.combo().streak(), 0);
        assert!(!s.is_resolved(TokenId(0)));
    }

    #[test]
    fn commit_into_full_crate_rejects_with_full() {
        let mut s = session();
        let r = resolver();
        let mut pc = PlacementController::new();
        pc.arm(&mut s, TokenId(0), 0).unwrap();
        assert!(matches!(pc.commit(&mut s, &r, ROCK, 0).unwrap(), CommitOutcome::Accepted { .. }));

        pc.arm(&mut s, TokenId(2), 0).unwrap();
        match pc.commit(&mut s, &r, ROCK, 0).unwrap() {
            CommitOutcome::Rejected { result, .. } => assert_eq!(result.reason, RejectReason::Full),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.container(ContainerId(0)).unwrap().filled, 1);
    }

    #[test]
    fn discard_into_bin_is_accepted() {
        let mut s = session();
        let r = resolver();
        let mut pc = PlacementController::new();
        pc.arm(&mut s, TokenId(3), 0).unwrap();
        let out = pc.commit(&mut s, &r, BIN, 0).unwrap();
        assert!(matches!(out, CommitOutcome::Accepted { target: Target::Discard, .. }));
        assert!(s.is_resolved(TokenId(3)));
        assert_eq!(s.budget().moves_remaining, 20);
    }

    #[test]
    fn grimy_and_hidden_tokens() {
        let mut lvl = session().level().clone();
        lvl.tokens[0].griminess = 1;
        lvl.tokens[1].is_undiscovered = true;
        lvl.tokens[1].reveal = RevealState::Hidden;
        let mut s = Session::new(2, lvl, Tuning::default(), 0, false);
        let mut pc = PlacementController::new();

        assert_eq!(
            pc.arm(&mut s, TokenId(0), 0).unwrap(),
            ArmOutcome::Cleaned { token: TokenId(0), remaining: 0 }
        );
        assert_eq!(pc.state(), PlacementState::Idle);
        assert_eq!(
            pc.arm(&mut s, TokenId(1), 0).unwrap(),
            ArmOutcome::Armed { token: TokenId(1), revealed: true }
        );
        assert_eq!(s.token(TokenId(1)).unwrap().reveal, RevealState::Revealed);
    }
}
