use super::*;
use sm_core::*;
use sm_ledger::Account;

/// Durable storage for games, their move logs and chat.
#[async_trait::async_trait]
pub trait GameRepository: Send + Sync {
    async fn create(&self, game: &Game) -> Result<(), Error>;
    async fn update(&self, game: &Game) -> Result<(), Error>;
    async fn fetch(&self, id: ID<Game>) -> Result<Option<Game>, Error>;
    /// Every game that has not reached a terminal state.
    async fn live(&self) -> Result<Vec<Game>, Error>;
    /// Unmatched games, oldest first.
    async fn waiting(&self, limit: i64) -> Result<Vec<Game>, Error>;
    /// Games an account took part in, newest first.
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Game>, Error>;
    /// Stores the advanced game and its new move log entry together.
    async fn record(&self, game: &Game, entry: &Move) -> Result<(), Error>;
    /// Move log entries with a ply greater than `since`, in order.
    async fn moves(&self, game: ID<Game>, since: Option<Ply>) -> Result<Vec<Move>, Error>;
    async fn chat(&self, message: &ChatMessage) -> Result<(), Error>;
    async fn chats(&self, game: ID<Game>, limit: i64) -> Result<Vec<ChatMessage>, Error>;
    async fn tally(&self) -> Result<Tally, Error>;
}
