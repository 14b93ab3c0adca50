use super::*;
use sm_core::*;
use sm_gameroom::Game;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process [`TournamentRepository`].
#[derive(Default)]
pub struct MemoryTournaments {
    tournaments: RwLock<HashMap<ID<Tournament>, Tournament>>,
    entrants: RwLock<HashMap<ID<Tournament>, Vec<Entrant>>>,
    pairings: RwLock<HashMap<ID<Tournament>, Vec<Pairing>>>,
}

#[async_trait::async_trait]
impl TournamentRepository for MemoryTournaments {
    async fn create(&self, tournament: &Tournament) -> Result<(), Error> {
        self.tournaments
            .write()
            .await
            .insert(tournament.id(), tournament.clone());
        Ok(())
    }
    async fn update(&self, tournament: &Tournament) -> Result<(), Error> {
        match self.tournaments.write().await.get_mut(&tournament.id()) {
            Some(stored) => {
                *stored = tournament.clone();
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }
    async fn fetch(&self, id: ID<Tournament>) -> Result<Option<Tournament>, Error> {
        Ok(self.tournaments.read().await.get(&id).cloned())
    }
    async fn list(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
        let mut all = self
            .tournaments
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        all.sort_by_key(|t| std::cmp::Reverse(t.created()));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }
    async fn champions(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
        let mut done = self
            .tournaments
            .read()
            .await
            .values()
            .filter(|t| t.status() == TournamentStatus::Completed)
            .cloned()
            .collect::<Vec<_>>();
        done.sort_by_key(|t| std::cmp::Reverse(t.ended()));
        done.truncate(limit.max(0) as usize);
        Ok(done)
    }
    async fn running(&self) -> Result<i64, Error> {
        Ok(self
            .tournaments
            .read()
            .await
            .values()
            .filter(|t| t.status() == TournamentStatus::Active)
            .count() as i64)
    }
    async fn enter(&self, tournament: &Tournament, entrant: &Entrant) -> Result<(), Error> {
        let mut entrants = self.entrants.write().await;
        let seats = entrants.entry(tournament.id()).or_default();
        if seats.iter().any(|e| e.account() == entrant.account()) {
            return Err(Error::AlreadyJoined);
        }
        self.update(tournament).await?;
        seats.push(entrant.clone());
        Ok(())
    }
    async fn entrants(&self, id: ID<Tournament>) -> Result<Vec<Entrant>, Error> {
        let mut seats = self
            .entrants
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default();
        seats.sort_by_key(|e| e.seed());
        Ok(seats)
    }
    async fn place(&self, entrant: &Entrant) -> Result<(), Error> {
        self.entrants
            .write()
            .await
            .get_mut(&entrant.tournament())
            .and_then(|seats| seats.iter_mut().find(|e| e.account() == entrant.account()))
            .map(|stored| *stored = entrant.clone())
            .ok_or(Error::NotFound)
    }
    async fn pair(&self, pairing: &Pairing) -> Result<(), Error> {
        self.pairings
            .write()
            .await
            .entry(pairing.tournament())
            .or_default()
            .push(pairing.clone());
        Ok(())
    }
    async fn repair(&self, pairing: &Pairing) -> Result<(), Error> {
        self.pairings
            .write()
            .await
            .get_mut(&pairing.tournament())
            .and_then(|all| all.iter_mut().find(|p| p.id() == pairing.id()))
            .map(|stored| *stored = pairing.clone())
            .ok_or(Error::NotFound)
    }
    async fn pairings(&self, id: ID<Tournament>) -> Result<Vec<Pairing>, Error> {
        Ok(self
            .pairings
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
    async fn pairing(&self, game: ID<Game>) -> Result<Option<Pairing>, Error> {
        Ok(self
            .pairings
            .read()
            .await
            .values()
            .flatten()
            .find(|p| p.game() == Some(game) && !p.is_resolved())
            .cloned())
    }
}
