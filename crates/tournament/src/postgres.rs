use super::*;
use sm_core::*;
use sm_gameroom::Game;
use sm_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

#[rustfmt::skip]
const TOURNAMENT_COLUMNS: &str = "id, organizer, name, description, fee, capacity, entrants, pool, control, status, winner, round, created, started, ended";
#[rustfmt::skip]
const ENTRANT_COLUMNS: &str = "tournament_id, account_id, seed, joined, eliminated, placement";
#[rustfmt::skip]
const PAIRING_COLUMNS: &str = "id, tournament_id, round, home, away, game_id, winner";

#[async_trait::async_trait]
impl TournamentRepository for Arc<Client> {
    async fn create(&self, t: &Tournament) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TOURNAMENTS,
                " (",
                TOURNAMENT_COLUMNS,
                ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
            ),
            &[
                &t.id().inner(),
                &t.organizer().inner(),
                &t.name(),
                &t.description(),
                &t.fee().inner(),
                &t.capacity(),
                &t.entrants(),
                &t.pool().inner(),
                &t.control().to_string(),
                &t.status().as_str(),
                &t.winner().map(|id| id.inner()),
                &t.round(),
                &t.created(),
                &t.started(),
                &t.ended(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn update(&self, t: &Tournament) -> Result<(), Error> {
        let n = self
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    TOURNAMENTS,
                    " SET entrants = $2, pool = $3, status = $4, winner = $5, round = $6,",
                    " started = $7, ended = $8",
                    " WHERE id = $1"
                ),
                &[
                    &t.id().inner(),
                    &t.entrants(),
                    &t.pool().inner(),
                    &t.status().as_str(),
                    &t.winner().map(|id| id.inner()),
                    &t.round(),
                    &t.started(),
                    &t.ended(),
                ],
            )
            .await?;
        match n {
            1 => Ok(()),
            _ => Err(Error::NotFound),
        }
    }
    async fn fetch(&self, id: ID<Tournament>) -> Result<Option<Tournament>, Error> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT ",
                TOURNAMENT_COLUMNS,
                " FROM ",
                TOURNAMENTS,
                " WHERE id = $1"
            ),
            &[&id.inner()],
        )
        .await?
        .as_ref()
        .map(Tournament::try_from)
        .transpose()
    }
    async fn list(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                TOURNAMENT_COLUMNS,
                " FROM ",
                TOURNAMENTS,
                " ORDER BY created DESC LIMIT $1"
            ),
            &[&limit],
        )
        .await?
        .iter()
        .map(Tournament::try_from)
        .collect()
    }
    async fn champions(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                TOURNAMENT_COLUMNS,
                " FROM ",
                TOURNAMENTS,
                " WHERE status = 'completed' ORDER BY ended DESC LIMIT $1"
            ),
            &[&limit],
        )
        .await?
        .iter()
        .map(Tournament::try_from)
        .collect()
    }
    async fn running(&self) -> Result<i64, Error> {
        self.query_one(
            const_format::concatcp!("SELECT COUNT(*) FROM ", TOURNAMENTS, " WHERE status = 'active'"),
            &[],
        )
        .await
        .map(|row| row.get::<_, i64>(0))
        .map_err(Error::from)
    }
    async fn enter(&self, t: &Tournament, entrant: &Entrant) -> Result<(), Error> {
        // the count guard and the primary key reject lost races and duplicates
        let n = self
            .execute(
                const_format::concatcp!(
                    "WITH t AS (UPDATE ",
                    TOURNAMENTS,
                    " SET entrants = $3, pool = $4",
                    " WHERE id = $1 AND status = 'open' AND entrants = $3 - 1 RETURNING id) ",
                    "INSERT INTO ",
                    ENTRANTS,
                    " (",
                    ENTRANT_COLUMNS,
                    ") SELECT id, $2::UUID, $5::INTEGER, $6::TIMESTAMPTZ, FALSE, NULL FROM t"
                ),
                &[
                    &t.id().inner(),
                    &entrant.account().inner(),
                    &t.entrants(),
                    &t.pool().inner(),
                    &entrant.seed(),
                    &entrant.joined(),
                ],
            )
            .await?;
        match n {
            1 => Ok(()),
            _ => Err(Error::Storage(format!("entry into {} was not stored", t.id()))),
        }
    }
    async fn entrants(&self, id: ID<Tournament>) -> Result<Vec<Entrant>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                ENTRANT_COLUMNS,
                " FROM ",
                ENTRANTS,
                " WHERE tournament_id = $1 ORDER BY seed"
            ),
            &[&id.inner()],
        )
        .await
        .map(|rows| rows.iter().map(Entrant::from).collect())
        .map_err(Error::from)
    }
    async fn place(&self, entrant: &Entrant) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                ENTRANTS,
                " SET eliminated = $3, placement = $4 WHERE tournament_id = $1 AND account_id = $2"
            ),
            &[
                &entrant.tournament().inner(),
                &entrant.account().inner(),
                &entrant.eliminated(),
                &entrant.placement(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn pair(&self, p: &Pairing) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                PAIRINGS,
                " (",
                PAIRING_COLUMNS,
                ") VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &p.id().inner(),
                &p.tournament().inner(),
                &p.round(),
                &p.home().inner(),
                &p.away().map(|id| id.inner()),
                &p.game().map(|id| id.inner()),
                &p.winner().map(|id| id.inner()),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn repair(&self, p: &Pairing) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                PAIRINGS,
                " SET game_id = $2, winner = $3 WHERE id = $1"
            ),
            &[
                &p.id().inner(),
                &p.game().map(|id| id.inner()),
                &p.winner().map(|id| id.inner()),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn pairings(&self, id: ID<Tournament>) -> Result<Vec<Pairing>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                PAIRING_COLUMNS,
                " FROM ",
                PAIRINGS,
                " WHERE tournament_id = $1 ORDER BY round, home"
            ),
            &[&id.inner()],
        )
        .await
        .map(|rows| rows.iter().map(Pairing::from).collect())
        .map_err(Error::from)
    }
    async fn pairing(&self, game: ID<Game>) -> Result<Option<Pairing>, Error> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT ",
                PAIRING_COLUMNS,
                " FROM ",
                PAIRINGS,
                " WHERE game_id = $1 AND winner IS NULL"
            ),
            &[&game.inner()],
        )
        .await
        .map(|opt| opt.as_ref().map(Pairing::from))
        .map_err(Error::from)
    }
}
