//! Engine runtime.
//!
//! One task owns the [`Engine`]. Client commands arrive over a bounded channel,
//! replies and events leave over an unbounded one, and a `tokio::time::interval`
//! drives [`Engine::tick`] so decay and budget timers fire without input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::core::{EngineError, Result as EngineResult};
use crate::engine::{Engine, MagneticResolver};
use crate::protocol::{create_ack, create_error, ClientMessage, ServerMessage};
use crate::types::PointerPos;

/// Command delivered to the engine task.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub message: ClientMessage,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, msg: ServerMessage },
    Broadcast { msg: ServerMessage },
}

/// Own `engine` until the command channel closes.
pub async fn run_engine(
    mut engine: Engine,
    mut cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    tick: Duration,
) {
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                let seq = cmd.message.seq();
                let reply = match apply(&mut engine, cmd.message, now_ms()) {
                    Ok(Some(reply)) => reply,
                    Ok(None) => create_ack(seq),
                    Err(e) => {
                        debug!(client = cmd.client_id, seq, code = e.code(), "command refused");
                        create_error(seq, e.code(), e.to_string())
                    }
                };
                let _ = out_tx.send(OutboundMessage::ToClient { client_id: cmd.client_id, msg: reply });
            }
            _ = interval.tick() => {
                engine.tick(now_ms());
            }
        }

        for event in engine.drain_events() {
            let _ = out_tx.send(OutboundMessage::Broadcast {
                msg: ServerMessage::Event { event },
            });
        }
    }

    engine.teardown();
    info!("engine task stopped");
}

/// Apply one command. `Ok(None)` means a plain ack.
pub fn apply(engine: &mut Engine, msg: ClientMessage, now_ms: u64) -> EngineResult<Option<ServerMessage>> {
    match msg {
        ClientMessage::StartSession {
            progression,
            difficulty,
            endless,
            ..
        } => {
            engine.start_session(progression, difficulty, endless, now_ms);
        }
        ClientMessage::Layout {
            containers,
            discard,
            container_radius,
            discard_radius,
            ..
        } => {
            let defaults = MagneticResolver::default();
            let mut resolver = MagneticResolver::new(
                container_radius.unwrap_or(defaults.container_radius()),
                discard_radius.unwrap_or(defaults.discard_radius()),
            );
            for c in containers {
                resolver.set_container_center(c.id, PointerPos::new(c.x, c.y));
            }
            if let Some(d) = discard {
                resolver.set_discard_center(d);
            }
            engine.set_resolver(Box::new(resolver));
        }
        ClientMessage::Arm { token_id, x, y, .. } => {
            engine.arm_token(token_id, PointerPos::new(x, y), now_ms)?;
        }
        ClientMessage::Pointer { x, y, .. } => {
            engine.update_pointer(PointerPos::new(x, y))?;
        }
        ClientMessage::Commit { x, y, .. } => {
            engine.commit(PointerPos::new(x, y), now_ms)?;
        }
        ClientMessage::Hint { .. } => {
            engine.use_hint(now_ms)?;
        }
        ClientMessage::Restart { .. } => {
            engine.restart_session(now_ms)?;
        }
        ClientMessage::FlingSettled { token_id, .. } => {
            engine.fling_settled(token_id, now_ms)?;
        }
        ClientMessage::Snapshot { seq } => {
            let snapshot = engine.snapshot();
            if snapshot.is_none() {
                return Err(EngineError::NoSession);
            }
            return Ok(Some(ServerMessage::Snapshot { seq, snapshot }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::types::{EngineEvent, TokenId};

    #[test]
    fn snapshot_without_session_is_refused() {
        let mut engine = Engine::new(EngineOptions::default());
        let err = apply(&mut engine, ClientMessage::Snapshot { seq: 1 }, 0).unwrap_err();
        assert_eq!(err.code(), "no_session");
    }

    #[test]
    fn start_then_snapshot() {
        let mut engine = Engine::new(EngineOptions::default());
        let ack = apply(
            &mut engine,
            ClientMessage::StartSession {
                seq: 1,
                progression: 0,
                difficulty: Default::default(),
                endless: false,
            },
            0,
        )
        .unwrap();
        assert!(ack.is_none());
        assert!(matches!(engine.drain_events()[0], EngineEvent::SessionStarted { .. }));

        match apply(&mut engine, ClientMessage::Snapshot { seq: 2 }, 0).unwrap() {
            Some(ServerMessage::Snapshot { seq: 2, snapshot: Some(s) }) => {
                assert!(!s.containers.is_empty());
                assert!(s.playable());
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = apply(
            &mut engine,
            ClientMessage::Arm { seq: 3, token_id: TokenId(9_999), x: 0.0, y: 0.0 },
            0,
        )
        .unwrap_err();
        assert_eq!(err.code(), "unknown_token");
    }
}
