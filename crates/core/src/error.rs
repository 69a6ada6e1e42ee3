use thiserror::Error;

use crate::types::{ContainerId, TokenId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no session is running")]
    NoSession,

    #[error("session is already over")]
    SessionOver,

    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    #[error("unknown container: {0}")]
    UnknownContainer(ContainerId),

    #[error("{0} is already resolved")]
    TokenResolved(TokenId),

    #[error("{0} is full")]
    ContainerFull(ContainerId),

    #[error("{0} is still grimy")]
    TokenGrimy(TokenId),

    #[error("{0} has no fling in flight")]
    NotInFlight(TokenId),

    #[error("commit has no target")]
    NoTarget,

    #[error("no hint available")]
    HintUnavailable,

    #[error("invalid tuning: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Stable code used on the adapter wire.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NoSession => "no_session",
            EngineError::SessionOver => "session_over",
            EngineError::UnknownToken(_) => "unknown_token",
            EngineError::UnknownContainer(_) => "unknown_container",
            EngineError::TokenResolved(_) => "token_resolved",
            EngineError::ContainerFull(_) => "container_full",
            EngineError::TokenGrimy(_) => "token_grimy",
            EngineError::NotInFlight(_) => "not_in_flight",
            EngineError::NoTarget => "no_target",
            EngineError::HintUnavailable => "hint_unavailable",
            EngineError::Config(_) => "invalid_config",
            EngineError::Io(_) => "io",
            EngineError::Json(_) => "invalid_json",
        }
    }

    /// Caller bugs (double commit, overfill) as opposed to expected refusals.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EngineError::TokenResolved(_) | EngineError::ContainerFull(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violations_are_flagged() {
        assert!(EngineError::TokenResolved(TokenId(3)).is_contract_violation());
        assert!(EngineError::ContainerFull(ContainerId(1)).is_contract_violation());
        assert!(!EngineError::HintUnavailable.is_contract_violation());
        assert_eq!(EngineError::ContainerFull(ContainerId(1)).to_string(), "crate#1 is full");
    }
}
