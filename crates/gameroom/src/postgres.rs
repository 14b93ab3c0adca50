use super::*;
use sm_core::*;
use sm_ledger::Account;
use sm_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::Row;

#[rustfmt::skip]
const GAME_COLUMNS: &str = "id, creator, opponent, wager, control, status, winner, position, ply, rated, bracket, created, started, completed";

fn games(rows: Vec<Row>) -> Result<Vec<Game>, Error> {
    rows.iter().map(Game::try_from).collect()
}

#[async_trait::async_trait]
impl GameRepository for Arc<Client> {
    async fn create(&self, game: &Game) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                GAMES,
                " (",
                GAME_COLUMNS,
                ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
            ),
            &[
                &game.id().inner(),
                &game.creator().inner(),
                &game.opponent().map(|id| id.inner()),
                &game.wager().inner(),
                &game.control().to_string(),
                &game.status().as_str(),
                &game.winner().map(|id| id.inner()),
                &game.position(),
                &game.ply(),
                &game.rated(),
                &game.is_bracket(),
                &game.created(),
                &game.started(),
                &game.completed(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn update(&self, game: &Game) -> Result<(), Error> {
        let n = self
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    GAMES,
                    " SET opponent = $2, status = $3, winner = $4, position = $5, ply = $6,",
                    " rated = $7, started = $8, completed = $9",
                    " WHERE id = $1"
                ),
                &[
                    &game.id().inner(),
                    &game.opponent().map(|id| id.inner()),
                    &game.status().as_str(),
                    &game.winner().map(|id| id.inner()),
                    &game.position(),
                    &game.ply(),
                    &game.rated(),
                    &game.started(),
                    &game.completed(),
                ],
            )
            .await?;
        match n {
            1 => Ok(()),
            _ => Err(Error::NotFound),
        }
    }
    async fn fetch(&self, id: ID<Game>) -> Result<Option<Game>, Error> {
        self.query_opt(
            const_format::concatcp!("SELECT ", GAME_COLUMNS, " FROM ", GAMES, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?
        .as_ref()
        .map(Game::try_from)
        .transpose()
    }
    async fn live(&self) -> Result<Vec<Game>, Error> {
        games(
            self.query(
                const_format::concatcp!(
                    "SELECT ",
                    GAME_COLUMNS,
                    " FROM ",
                    GAMES,
                    " WHERE status IN ('waiting', 'active')"
                ),
                &[],
            )
            .await?,
        )
    }
    async fn waiting(&self, limit: i64) -> Result<Vec<Game>, Error> {
        games(
            self.query(
                const_format::concatcp!(
                    "SELECT ",
                    GAME_COLUMNS,
                    " FROM ",
                    GAMES,
                    " WHERE status = 'waiting' ORDER BY created LIMIT $1"
                ),
                &[&limit],
            )
            .await?,
        )
    }
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Game>, Error> {
        games(
            self.query(
                const_format::concatcp!(
                    "SELECT ",
                    GAME_COLUMNS,
                    " FROM ",
                    GAMES,
                    " WHERE creator = $1 OR opponent = $1 ORDER BY created DESC LIMIT $2"
                ),
                &[&account.inner(), &limit],
            )
            .await?,
        )
    }
    async fn record(&self, game: &Game, entry: &Move) -> Result<(), Error> {
        // one statement, so the log never runs ahead of the game row
        let n = self
            .execute(
                const_format::concatcp!(
                    "WITH g AS (UPDATE ",
                    GAMES,
                    " SET ply = $2, position = $3 WHERE id = $1 AND ply = $4 RETURNING id) ",
                    "INSERT INTO ",
                    MOVES,
                    " (game_id, ply, author, notation, position, created) ",
                    "SELECT id, $4::INTEGER, $5::UUID, $6::TEXT, $3::TEXT, $7::TIMESTAMPTZ FROM g"
                ),
                &[
                    &game.id().inner(),
                    &game.ply(),
                    &game.position(),
                    &entry.ply(),
                    &entry.author().inner(),
                    &entry.notation(),
                    &entry.created(),
                ],
            )
            .await?;
        match n {
            1 => Ok(()),
            _ => Err(Error::Storage(format!("move {} of {} was not stored", entry.ply(), game.id()))),
        }
    }
    async fn moves(&self, game: ID<Game>, since: Option<Ply>) -> Result<Vec<Move>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT game_id, ply, author, notation, position, created FROM ",
                MOVES,
                " WHERE game_id = $1 AND ply > $2 ORDER BY ply"
            ),
            &[&game.inner(), &since.unwrap_or(-1)],
        )
        .await
        .map(|rows| rows.iter().map(Move::from).collect())
        .map_err(Error::from)
    }
    async fn chat(&self, message: &ChatMessage) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                CHATS,
                " (id, game_id, author, text, created) VALUES ($1, $2, $3, $4, $5)"
            ),
            &[
                &message.id().inner(),
                &message.game().inner(),
                &message.author().inner(),
                &message.text(),
                &message.created(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn chats(&self, game: ID<Game>, limit: i64) -> Result<Vec<ChatMessage>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT id, game_id, author, text, created FROM (",
                "SELECT id, game_id, author, text, created FROM ",
                CHATS,
                " WHERE game_id = $1 ORDER BY created DESC LIMIT $2",
                ") recent ORDER BY created"
            ),
            &[&game.inner(), &limit],
        )
        .await
        .map(|rows| rows.iter().map(ChatMessage::from).collect())
        .map_err(Error::from)
    }
    async fn tally(&self) -> Result<Tally, Error> {
        self.query_one(
            const_format::concatcp!(
                "SELECT COUNT(*), COALESCE(SUM(wager) FILTER (WHERE status = 'completed'), 0)::BIGINT FROM ",
                GAMES
            ),
            &[],
        )
        .await
        .map(|row| Tally {
            games: row.get::<_, i64>(0),
            volume: Amount::from(row.get::<_, i64>(1)),
        })
        .map_err(Error::from)
    }
}
