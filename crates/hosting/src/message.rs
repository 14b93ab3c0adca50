use serde::Deserialize;
use serde::Serialize;
use sm_core::*;
use sm_gameroom::*;
use sm_ledger::Account;

/// Messages received from the client over WebSocket.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Binds the connection to the account behind `token`. A player coming
    /// back within grace is put back in their room, replaying moves after `since`.
    Auth {
        token: String,
        #[serde(default, rename = "accountId")]
        account: Option<ID<Account>>,
        #[serde(default)]
        since: Option<Ply>,
    },
    /// Enters a game room, replaying moves after ply `since`.
    JoinGame {
        #[serde(rename = "gameId")]
        game: ID<Game>,
        #[serde(default)]
        since: Option<Ply>,
    },
    ChatMessage { content: String },
    GameMove {
        #[serde(rename = "move")]
        notation: String,
    },
    /// Leaves the current game for good, conceding it.
    Resign,
}

impl TryFrom<&str> for ClientMessage {
    type Error = Error;
    fn try_from(text: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(text).map_err(|_| Error::invalid("unrecognized message"))
    }
}

/// Messages sent from server to client over WebSocket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected,
    Authenticated {
        #[serde(rename = "accountId")]
        account: ID<Account>,
    },
    Joined {
        game: Game,
        moves: Vec<Move>,
    },
    ChatMessage {
        data: sm_gameroom::ChatMessage,
    },
    GameMove {
        data: Played,
    },
    GameOver {
        data: Game,
    },
    OpponentDisconnected {
        #[serde(rename = "graceSeconds")]
        grace: u64,
    },
    OpponentReconnected,
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(e: &Error) -> Self {
        Self::Error {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
