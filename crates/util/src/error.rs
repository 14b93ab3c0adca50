/// Errors surfaced by every core component.
///
/// Each variant carries a stable snake_case [`code`](Error::code) for
/// clients and a human-readable message via `Display`. Nothing here
/// exposes internal detail beyond what the caller already supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InsufficientFunds,
    LedgerContention,
    GameNotJoinable,
    SelfJoin,
    NotAParticipant,
    OutOfTurn,
    AlreadySettled,
    AlreadyJoined,
    TournamentFull,
    NotOpen,
    NotFound,
    InvalidInput(String),
    InvalidTransition(String),
    IllegalMove(String),
    Unauthorized,
    Storage(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds => "insufficient_funds",
            Self::LedgerContention => "ledger_contention",
            Self::GameNotJoinable => "game_not_joinable",
            Self::SelfJoin => "self_join",
            Self::NotAParticipant => "not_a_participant",
            Self::OutOfTurn => "out_of_turn",
            Self::AlreadySettled => "already_settled",
            Self::AlreadyJoined => "already_joined",
            Self::TournamentFull => "tournament_full",
            Self::NotOpen => "not_open",
            Self::NotFound => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::IllegalMove(_) => "illegal_move",
            Self::Unauthorized => "unauthorized",
            Self::Storage(_) => "storage",
        }
    }
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }
    /// Whether the caller could succeed by retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LedgerContention | Self::Storage(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds => write!(f, "insufficient funds"),
            Self::LedgerContention => write!(f, "balance is busy, try again"),
            Self::GameNotJoinable => write!(f, "game is not open for joining"),
            Self::SelfJoin => write!(f, "cannot join your own game"),
            Self::NotAParticipant => write!(f, "not a participant"),
            Self::OutOfTurn => write!(f, "not your turn"),
            Self::AlreadySettled => write!(f, "already settled"),
            Self::AlreadyJoined => write!(f, "already joined"),
            Self::TournamentFull => write!(f, "tournament is full"),
            Self::NotOpen => write!(f, "tournament is not open"),
            Self::NotFound => write!(f, "not found"),
            Self::InvalidInput(s) => write!(f, "invalid input: {}", s),
            Self::InvalidTransition(s) => write!(f, "invalid transition: {}", s),
            Self::IllegalMove(s) => write!(f, "illegal move: {}", s),
            Self::Unauthorized => write!(f, "unauthorized"),
            // storage detail stays in the logs
            Self::Storage(_) => write!(f, "storage unavailable"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "database")]
impl From<tokio_postgres::Error> for Error {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn codes_are_snake_case() {
        assert_eq!(Error::InsufficientFunds.code(), "insufficient_funds");
        assert_eq!(Error::AlreadySettled.code(), "already_settled");
        assert_eq!(Error::invalid("x").code(), "invalid_input");
    }
    #[test]
    fn storage_detail_is_hidden() {
        let e = Error::Storage("connection refused at 10.0.0.3".into());
        assert_eq!(e.to_string(), "storage unavailable");
    }
}
