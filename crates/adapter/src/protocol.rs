//! Wire protocol: one JSON object per line, discriminated by `type`.

use serde::{Deserialize, Serialize};

use crate::core::SessionSnapshot;
use crate::types::{ContainerId, Difficulty, EngineEvent, PointerPos, TokenId};

/// A crate center for the magnetic resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterSpec {
    pub id: ContainerId,
    pub x: f32,
    pub y: f32,
}

/// Client -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartSession {
        seq: u64,
        progression: u32,
        #[serde(default)]
        difficulty: Difficulty,
        #[serde(default)]
        endless: bool,
    },
    /// Screen geometry used to resolve pointer positions.
    Layout {
        seq: u64,
        containers: Vec<CenterSpec>,
        #[serde(default)]
        discard: Option<PointerPos>,
        #[serde(default)]
        container_radius: Option<f32>,
        #[serde(default)]
        discard_radius: Option<f32>,
    },
    Arm {
        seq: u64,
        token_id: TokenId,
        x: f32,
        y: f32,
    },
    Pointer {
        seq: u64,
        x: f32,
        y: f32,
    },
    Commit {
        seq: u64,
        x: f32,
        y: f32,
    },
    Hint {
        seq: u64,
    },
    Restart {
        seq: u64,
    },
    FlingSettled {
        seq: u64,
        token_id: TokenId,
    },
    Snapshot {
        seq: u64,
    },
}

impl ClientMessage {
    pub fn seq(&self) -> u64 {
        match self {
            ClientMessage::StartSession { seq, .. }
            | ClientMessage::Layout { seq, .. }
            | ClientMessage::Arm { seq, .. }
            | ClientMessage::Pointer { seq, .. }
            | ClientMessage::Commit { seq, .. }
            | ClientMessage::Hint { seq }
            | ClientMessage::Restart { seq }
            | ClientMessage::FlingSettled { seq, .. }
            | ClientMessage::Snapshot { seq } => *seq,
        }
    }
}

/// Server -> client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack {
        seq: u64,
    },
    Error {
        seq: u64,
        code: String,
        message: String,
    },
    Event {
        event: EngineEvent,
    },
    Snapshot {
        seq: u64,
        snapshot: Option<SessionSnapshot>,
    },
}

/// Protocol-level error codes. Engine refusals use `EngineError::code()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidJson,
    UnknownType,
    InvalidSeq,
    Backpressure,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::UnknownType => "unknown_type",
            ErrorCode::InvalidSeq => "invalid_seq",
            ErrorCode::Backpressure => "backpressure",
        }
    }
}

pub fn create_ack(seq: u64) -> ServerMessage {
    ServerMessage::Ack { seq }
}

pub fn create_error(seq: u64, code: &str, message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error {
        seq,
        code: code.to_string(),
        message: message.into(),
    }
}

/// Parse failure, carrying whatever `seq` could be recovered for the error reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub seq: u64,
    pub code: ErrorCode,
    pub message: String,
}

const KNOWN_TYPES: [&str; 9] = [
    "start_session",
    "layout",
    "arm",
    "pointer",
    "commit",
    "hint",
    "restart",
    "fling_settled",
    "snapshot",
];

pub fn parse_message(line: &str) -> Result<ClientMessage, ParseFailure> {
    serde_json::from_str::<ClientMessage>(line).map_err(|e| {
        #[derive(Deserialize)]
        struct Envelope<'a> {
            #[serde(rename = "type", borrow)]
            msg_type: Option<&'a str>,
            seq: Option<u64>,
        }
        match serde_json::from_str::<Envelope>(line) {
            Ok(env) => {
                let known = env.msg_type.map(|t| KNOWN_TYPES.contains(&t)).unwrap_or(false);
                ParseFailure {
                    seq: env.seq.unwrap_or(0),
                    code: if known {
                        ErrorCode::InvalidJson
                    } else {
                        ErrorCode::UnknownType
                    },
                    message: e.to_string(),
                }
            }
            Err(_) => ParseFailure {
                seq: extract_seq_best_effort(line).unwrap_or(0),
                code: ErrorCode::InvalidJson,
                message: e.to_string(),
            },
        }
    })
}

/// Pull `"seq": N` out of a line that is not valid JSON.
fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}
