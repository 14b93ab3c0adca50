use super::*;
use sm_core::*;
use sm_ledger::Account;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process [`GameRepository`].
#[derive(Default)]
pub struct MemoryGames {
    games: RwLock<HashMap<ID<Game>, Game>>,
    moves: RwLock<HashMap<ID<Game>, Vec<Move>>>,
    chats: RwLock<HashMap<ID<Game>, Vec<ChatMessage>>>,
}

impl MemoryGames {
    async fn select<F>(&self, f: F) -> Vec<Game>
    where
        F: Fn(&Game) -> bool,
    {
        self.games
            .read()
            .await
            .values()
            .filter(|g| f(g))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl GameRepository for MemoryGames {
    async fn create(&self, game: &Game) -> Result<(), Error> {
        self.games.write().await.insert(game.id(), game.clone());
        Ok(())
    }
    async fn update(&self, game: &Game) -> Result<(), Error> {
        match self.games.write().await.get_mut(&game.id()) {
            Some(stored) => {
                *stored = game.clone();
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }
    async fn fetch(&self, id: ID<Game>) -> Result<Option<Game>, Error> {
        Ok(self.games.read().await.get(&id).cloned())
    }
    async fn live(&self) -> Result<Vec<Game>, Error> {
        Ok(self.select(|g| !g.status().is_terminal()).await)
    }
    async fn waiting(&self, limit: i64) -> Result<Vec<Game>, Error> {
        let mut games = self.select(|g| g.status() == Status::Waiting).await;
        games.sort_by_key(|g| g.created());
        games.truncate(limit.max(0) as usize);
        Ok(games)
    }
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Game>, Error> {
        let mut games = self.select(|g| g.is_participant(account)).await;
        games.sort_by_key(|g| std::cmp::Reverse(g.created()));
        games.truncate(limit.max(0) as usize);
        Ok(games)
    }
    async fn record(&self, game: &Game, entry: &Move) -> Result<(), Error> {
        let mut moves = self.moves.write().await;
        let log = moves.entry(game.id()).or_default();
        if log.iter().any(|m| m.ply() == entry.ply()) {
            return Err(Error::Storage(format!("duplicate ply {} in {}", entry.ply(), game.id())));
        }
        self.update(game).await?;
        log.push(entry.clone());
        Ok(())
    }
    async fn moves(&self, game: ID<Game>, since: Option<Ply>) -> Result<Vec<Move>, Error> {
        Ok(self
            .moves
            .read()
            .await
            .get(&game)
            .map(|log| {
                log.iter()
                    .filter(|m| since.is_none_or(|s| m.ply() > s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
    async fn chat(&self, message: &ChatMessage) -> Result<(), Error> {
        self.chats
            .write()
            .await
            .entry(message.game())
            .or_default()
            .push(message.clone());
        Ok(())
    }
    async fn chats(&self, game: ID<Game>, limit: i64) -> Result<Vec<ChatMessage>, Error> {
        Ok(self
            .chats
            .read()
            .await
            .get(&game)
            .map(|log| {
                let skip = log.len().saturating_sub(limit.max(0) as usize);
                log[skip..].to_vec()
            })
            .unwrap_or_default())
    }
    async fn tally(&self) -> Result<Tally, Error> {
        let games = self.games.read().await;
        let volume = games
            .values()
            .filter(|g| g.status() == Status::Completed)
            .try_fold(Amount::ZERO, |sum, g| sum.checked_add(g.wager()))
            .ok_or_else(|| Error::invalid("volume overflow"))?;
        Ok(Tally {
            games: games.len() as i64,
            volume,
        })
    }
}
