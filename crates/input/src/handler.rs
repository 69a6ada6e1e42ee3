//! Pointer dispatcher for terminal environments.
//!
//! Terminal mouse reports arrive in bursts between frames. Samples are queued,
//! consecutive drags coalesce to the newest one, and the queue is flushed into
//! the [`Engine`] once per frame. Validity is always decided from the release
//! position, so coalescing never changes an outcome.

use arrayvec::ArrayVec;

use crate::engine::{ArmOutcome, CommitOutcome, Engine};
use crate::map::PointerInput;
use crate::types::{PointerPos, Target, TokenId};

const PENDING_CAPACITY: usize = 32;

/// Screen region where the front record rests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrayRegion {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl TrayRegion {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn contains(&self, p: PointerPos) -> bool {
        p.x >= self.left && p.x < self.left + self.width && p.y >= self.top && p.y < self.top + self.height
    }
}

/// What a flushed sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Arm(ArmOutcome),
    Target(Target, bool),
    Commit(CommitOutcome),
    /// The engine refused the sample (error code).
    Refused(&'static str),
}

#[derive(Debug, Clone)]
pub struct PointerDispatcher {
    tray: TrayRegion,
    pending: ArrayVec<PointerInput, PENDING_CAPACITY>,
    pressed: bool,
}

impl PointerDispatcher {
    pub fn new(tray: TrayRegion) -> Self {
        Self {
            tray,
            pending: ArrayVec::new(),
            pressed: false,
        }
    }

    pub fn set_tray(&mut self, tray: TrayRegion) {
        self.tray = tray;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a sample. Consecutive drags coalesce.
    ///
    /// When the queue is full the oldest drag makes room. Presses and releases
    /// are only ever dropped together as a complete click, so an armed record
    /// always sees its release.
    pub fn push(&mut self, input: PointerInput) {
        if let (PointerInput::Drag(pos), Some(PointerInput::Drag(last))) =
            (input, self.pending.last_mut())
        {
            *last = pos;
            return;
        }
        if self.pending.is_full() && !self.make_room(input) {
            return;
        }
        self.pending.push(input);
    }

    /// Free one slot for `input`. Returns false when `input` should be dropped.
    fn make_room(&mut self, input: PointerInput) -> bool {
        if let Some(i) = self
            .pending
            .iter()
            .position(|p| matches!(p, PointerInput::Drag(_)))
        {
            self.pending.remove(i);
            return true;
        }
        if matches!(input, PointerInput::Drag(_)) {
            return false;
        }
        let click = self
            .pending
            .windows(2)
            .position(|w| matches!(w, [PointerInput::Down(_), PointerInput::Up(_)]));
        match click {
            Some(i) => {
                self.pending.drain(i..i + 2);
            }
            None => {
                self.pending.remove(0);
            }
        }
        true
    }

    /// Forget queued samples and any press in progress.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pressed = false;
    }

    /// Apply queued samples. `front` is the record resting in the tray.
    pub fn flush(
        &mut self,
        engine: &mut Engine,
        front: Option<TokenId>,
        now_ms: u64,
    ) -> ArrayVec<Dispatched, PENDING_CAPACITY> {
        let mut out = ArrayVec::new();
        let pending = std::mem::take(&mut self.pending);
        for input in pending {
            if let Some(d) = self.apply(engine, input, front, now_ms) {
                out.push(d);
            }
        }
        out
    }

    fn apply(
        &mut self,
        engine: &mut Engine,
        input: PointerInput,
        front: Option<TokenId>,
        now_ms: u64,
    ) -> Option<Dispatched> {
        match input {
            PointerInput::Down(pos) => {
                let token = front.filter(|_| self.tray.contains(pos))?;
                Some(match engine.arm_token(token, pos, now_ms) {
                    Ok(outcome) => {
                        self.pressed = matches!(outcome, ArmOutcome::Armed { .. });
                        Dispatched::Arm(outcome)
                    }
                    Err(e) => Dispatched::Refused(e.code()),
                })
            }
            PointerInput::Drag(pos) if self.pressed => match engine.update_pointer(pos) {
                Ok(changed) => changed.map(|(t, valid)| Dispatched::Target(t, valid)),
                Err(e) => Some(Dispatched::Refused(e.code())),
            },
            PointerInput::Up(pos) if self.pressed => {
                self.pressed = false;
                Some(match engine.commit(pos, now_ms) {
                    Ok(outcome) => Dispatched::Commit(outcome),
                    Err(e) => Dispatched::Refused(e.code()),
                })
            }
            PointerInput::Drag(_) | PointerInput::Up(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::core::{Budget, Level, MemoryProfile};
    use crate::engine::{EngineOptions, ShelfResolver};
    use crate::types::{Category, Container, ContainerId, Mode, Token};

    fn engine() -> Engine {
        let shelf = ShelfResolver::new(
            0.0,
            0.0,
            5.0,
            10.0,
            vec![Target::Container(ContainerId(0)), Target::Container(ContainerId(1))],
        );
        let mut e = Engine::with_parts(
            EngineOptions::default(),
            Box::new(MemoryProfile::new(1)),
            Box::new(shelf),
        );
        e.start_level(
            Level::handcrafted(
                vec![
                    Container::new(ContainerId(0), Category::Rock, 2),
                    Container::new(ContainerId(1), Category::Jazz, 1),
                ],
                vec![
                    Token::new(TokenId(0), Category::Jazz),
                    Token::new(TokenId(1), Category::Rock),
                    Token::new(TokenId(2), Category::Rock),
                ],
                Budget::moves(Mode::Standard, 10),
            ),
            0,
        );
        e
    }

    fn dispatcher() -> PointerDispatcher {
        PointerDispatcher::new(TrayRegion::new(0.0, 10.0, 20.0, 3.0))
    }

    #[test]
    fn drags_coalesce() {
        let mut d = dispatcher();
        d.push(PointerInput::Down(PointerPos::new(1.0, 11.0)));
        d.push(PointerInput::Drag(PointerPos::new(2.0, 8.0)));
        d.push(PointerInput::Drag(PointerPos::new(3.0, 6.0)));
        d.push(PointerInput::Drag(PointerPos::new(12.0, 2.0)));
        assert_eq!(d.pending(), 2);
    }

    #[test]
    fn overflow_evicts_drags_before_presses_and_releases() {
        let mut d = dispatcher();
        for i in 0..11 {
            let x = i as f32;
            d.push(PointerInput::Down(PointerPos::new(x, 11.0)));
            d.push(PointerInput::Drag(PointerPos::new(x, 5.0)));
            d.push(PointerInput::Up(PointerPos::new(x, 2.0)));
        }
        assert_eq!(d.pending(), PENDING_CAPACITY);
        let downs = d.pending.iter().filter(|p| matches!(p, PointerInput::Down(_))).count();
        let ups = d.pending.iter().filter(|p| matches!(p, PointerInput::Up(_))).count();
        assert_eq!((downs, ups), (11, 11));
    }

    #[test]
    fn a_full_queue_of_clicks_drops_drags_and_whole_clicks() {
        let mut d = dispatcher();
        for i in 0..16 {
            d.push(PointerInput::Down(PointerPos::new(i as f32, 11.0)));
            d.push(PointerInput::Up(PointerPos::new(i as f32, 2.0)));
        }
        d.push(PointerInput::Drag(PointerPos::new(3.0, 3.0)));
        assert_eq!(d.pending(), PENDING_CAPACITY);
        assert!(matches!(d.pending.last(), Some(PointerInput::Up(_))));

        d.push(PointerInput::Down(PointerPos::new(1.0, 11.0)));
        assert_eq!(d.pending(), PENDING_CAPACITY - 1);
        assert_eq!(d.pending[0], PointerInput::Down(PointerPos::new(1.0, 11.0)));
        assert!(matches!(d.pending.last(), Some(PointerInput::Down(_))));
    }

    #[test]
    fn a_press_survives_overflow_and_its_release_commits() {
        let mut e = engine();
        let mut d = dispatcher();
        d.push(PointerInput::Down(PointerPos::new(1.0, 11.0)));
        for _ in 0..15 {
            d.push(PointerInput::Drag(PointerPos::new(12.0, 2.0)));
            d.push(PointerInput::Down(PointerPos::new(1.0, 2.0)));
        }
        d.push(PointerInput::Drag(PointerPos::new(12.0, 2.0)));
        assert_eq!(d.pending(), PENDING_CAPACITY);
        d.push(PointerInput::Up(PointerPos::new(12.0, 2.0)));

        let out = d.flush(&mut e, Some(TokenId(0)), 50);
        assert!(matches!(out[0], Dispatched::Arm(ArmOutcome::Armed { .. })));
        assert!(matches!(out.last(), Some(Dispatched::Commit(CommitOutcome::Accepted { .. }))));
        assert!(e.session().unwrap().is_resolved(TokenId(0)));
    }

    #[test]
    fn press_drag_release_sorts_the_front_record() {
        let mut e = engine();
        let mut d = dispatcher();
        d.push(PointerInput::Down(PointerPos::new(1.0, 11.0)));
        d.push(PointerInput::Drag(PointerPos::new(12.0, 2.0)));
        d.push(PointerInput::Up(PointerPos::new(12.0, 2.0)));
        let out = d.flush(&mut e, Some(TokenId(0)), 50);

        assert!(matches!(out[0], Dispatched::Arm(ArmOutcome::Armed { .. })));
        assert_eq!(out[1], Dispatched::Target(Target::Container(ContainerId(1)), true));
        assert!(matches!(out[2], Dispatched::Commit(CommitOutcome::Accepted { .. })));
        assert!(!d.is_pressed());
        assert!(e.session().unwrap().is_resolved(TokenId(0)));
    }

    #[test]
    fn press_outside_the_tray_does_nothing() {
        let mut e = engine();
        let mut d = dispatcher();
        d.push(PointerInput::Down(PointerPos::new(1.0, 2.0)));
        d.push(PointerInput::Up(PointerPos::new(1.0, 2.0)));
        assert!(d.flush(&mut e, Some(TokenId(0)), 0).is_empty());
        assert_eq!(e.controller().armed_token(), None);
    }

    #[test]
    fn release_off_shelf_cancels() {
        let mut e = engine();
        let mut d = dispatcher();
        d.push(PointerInput::Down(PointerPos::new(1.0, 11.0)));
        d.push(PointerInput::Up(PointerPos::new(1.0, 11.0)));
        let out = d.flush(&mut e, Some(TokenId(0)), 0);
        assert_eq!(out[1], Dispatched::Commit(CommitOutcome::Cancelled { token: TokenId(0) }));
        assert_eq!(e.session().unwrap().budget().moves_remaining, 10);
    }
}
