use super::*;
use serde::Serialize;
use sm_core::*;
use sm_ledger::Account;
use std::time::SystemTime;

/// One entry of a game's move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    game: ID<Game>,
    ply: Ply,
    author: ID<Account>,
    notation: String,
    position: String,
    #[serde(with = "sm_core::epoch")]
    created: SystemTime,
}

impl Move {
    pub fn new(game: ID<Game>, ply: Ply, author: ID<Account>, notation: String, position: String) -> Self {
        Self {
            game,
            ply,
            author,
            notation,
            position,
            created: SystemTime::now(),
        }
    }
    pub fn game(&self) -> ID<Game> {
        self.game
    }
    pub fn ply(&self) -> Ply {
        self.ply
    }
    pub fn author(&self) -> ID<Account> {
        self.author
    }
    pub fn notation(&self) -> &str {
        &self.notation
    }
    pub fn position(&self) -> &str {
        &self.position
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
}

/// An immutable chat line posted in a game room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    id: ID<Self>,
    game: ID<Game>,
    author: ID<Account>,
    text: String,
    #[serde(with = "sm_core::epoch")]
    created: SystemTime,
}

impl ChatMessage {
    /// Trims and validates `text`.
    pub fn new(game: ID<Game>, author: ID<Account>, text: &str) -> Result<Self, Error> {
        let text = text.trim();
        match text.chars().count() {
            0 => Err(Error::invalid("message is empty")),
            n if n > CHAT_LIMIT => Err(Error::invalid(format!(
                "message exceeds {} characters",
                CHAT_LIMIT
            ))),
            _ => Ok(Self {
                id: ID::default(),
                game,
                author,
                text: text.to_string(),
                created: SystemTime::now(),
            }),
        }
    }
    pub fn game(&self) -> ID<Game> {
        self.game
    }
    pub fn author(&self) -> ID<Account> {
        self.author
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
}

impl Unique for ChatMessage {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Move {
        fn name() -> &'static str {
            MOVES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                MOVES,
                " (
                    game_id     UUID NOT NULL REFERENCES ",
                GAMES,
                "(id) ON DELETE CASCADE,
                    ply         INTEGER NOT NULL,
                    author      UUID NOT NULL,
                    notation    TEXT NOT NULL,
                    position    TEXT NOT NULL,
                    created     TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (game_id, ply)
                );"
            )
        }
        fn indices() -> &'static str {
            ""
        }
    }

    impl Schema for ChatMessage {
        fn name() -> &'static str {
            CHATS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                CHATS,
                " (
                    id          UUID PRIMARY KEY,
                    game_id     UUID NOT NULL REFERENCES ",
                GAMES,
                "(id) ON DELETE CASCADE,
                    author      UUID NOT NULL,
                    text        VARCHAR(500) NOT NULL,
                    created     TIMESTAMPTZ NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_chats_game ON ",
                CHATS,
                " (game_id, created);"
            )
        }
    }

    impl From<&tokio_postgres::Row> for Move {
        fn from(row: &tokio_postgres::Row) -> Self {
            Self {
                game: ID::from(row.get::<_, uuid::Uuid>(0)),
                ply: row.get::<_, Ply>(1),
                author: ID::from(row.get::<_, uuid::Uuid>(2)),
                notation: row.get::<_, String>(3),
                position: row.get::<_, String>(4),
                created: row.get::<_, SystemTime>(5),
            }
        }
    }

    impl From<&tokio_postgres::Row> for ChatMessage {
        fn from(row: &tokio_postgres::Row) -> Self {
            Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                game: ID::from(row.get::<_, uuid::Uuid>(1)),
                author: ID::from(row.get::<_, uuid::Uuid>(2)),
                text: row.get::<_, String>(3),
                created: row.get::<_, SystemTime>(4),
            }
        }
    }
}
