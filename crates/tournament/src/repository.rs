use super::*;
use sm_core::*;
use sm_gameroom::Game;

/// Durable storage for tournaments, entrants and bracket pairings.
#[async_trait::async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn create(&self, tournament: &Tournament) -> Result<(), Error>;
    async fn update(&self, tournament: &Tournament) -> Result<(), Error>;
    async fn fetch(&self, id: ID<Tournament>) -> Result<Option<Tournament>, Error>;
    /// Newest first.
    async fn list(&self, limit: i64) -> Result<Vec<Tournament>, Error>;
    /// Completed tournaments, most recently ended first.
    async fn champions(&self, limit: i64) -> Result<Vec<Tournament>, Error>;
    /// Number of tournaments being played.
    async fn running(&self) -> Result<i64, Error>;
    /// Stores `entrant` together with the tournament's new count and pool,
    /// or neither.
    async fn enter(&self, tournament: &Tournament, entrant: &Entrant) -> Result<(), Error>;
    /// In seed order.
    async fn entrants(&self, id: ID<Tournament>) -> Result<Vec<Entrant>, Error>;
    async fn place(&self, entrant: &Entrant) -> Result<(), Error>;
    async fn pair(&self, pairing: &Pairing) -> Result<(), Error>;
    async fn repair(&self, pairing: &Pairing) -> Result<(), Error>;
    async fn pairings(&self, id: ID<Tournament>) -> Result<Vec<Pairing>, Error>;
    /// The unresolved pairing currently played out in `game`.
    async fn pairing(&self, game: ID<Game>) -> Result<Option<Pairing>, Error>;
}
