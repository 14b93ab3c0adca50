use super::*;
use serde::Serialize;
use sm_core::*;
use sm_gameroom::*;
use sm_ledger::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

const LISTING_LIMIT: i64 = 50;

/// A tournament with its entrants and every pairing so far.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    #[serde(flatten)]
    pub tournament: Tournament,
    #[serde(rename = "players")]
    pub entrants: Vec<Entrant>,
    pub pairings: Vec<Pairing>,
}

/// Runs tournaments from registration to payout.
///
/// Transitions of one tournament are serialized by its own [`Mutex`].
/// Bracket games are ordinary zero-wager games in the [`Registry`]; results
/// arrive through the [`Observer`] hook once those games finish.
pub struct Tournaments {
    ledger: Ledger,
    registry: Arc<Registry>,
    repo: Arc<dyn TournamentRepository>,
    cells: RwLock<HashMap<ID<Tournament>, Arc<Mutex<Tournament>>>>,
}

impl Tournaments {
    pub fn new(ledger: Ledger, registry: Arc<Registry>, repo: Arc<dyn TournamentRepository>) -> Self {
        Self {
            ledger,
            registry,
            repo,
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to game results from the registry.
    pub async fn attach(self: &Arc<Self>) {
        let observer: Arc<dyn Observer> = self.clone();
        self.registry.observe(Arc::downgrade(&observer)).await;
    }

    async fn cell(&self, id: ID<Tournament>) -> Result<Arc<Mutex<Tournament>>, Error> {
        if let Some(cell) = self.cells.read().await.get(&id) {
            return Ok(cell.clone());
        }
        let tournament = self.repo.fetch(id).await?.ok_or(Error::NotFound)?;
        Ok(self
            .cells
            .write()
            .await
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(tournament)))
            .clone())
    }

    /// Opens round one. The caller holds the tournament's lock.
    async fn begin(&self, t: &mut Tournament) -> Result<(), Error> {
        let mut next = t.clone();
        next.start()?;
        self.repo.update(&next).await?;
        *t = next;
        let seeded = self
            .repo
            .entrants(t.id())
            .await?
            .iter()
            .map(Entrant::account)
            .collect::<Vec<_>>();
        log::info!("[tournament] {} started with {} entrants", t.id(), seeded.len());
        self.schedule(t, &seeded).await
    }

    /// Pairs `seeded` for the tournament's current round.
    async fn schedule(&self, t: &Tournament, seeded: &[ID<Account>]) -> Result<(), Error> {
        let (pairs, bye) = pairing::bracket(seeded);
        for (home, away) in pairs {
            let game = self.registry.pair(home, away, t.control()).await?;
            self.repo.pair(&Pairing::matched(t.id(), t.round(), &game)).await?;
        }
        if let Some(home) = bye {
            log::debug!("[tournament] {} round {} bye for {}", t.id(), t.round(), home);
            self.repo.pair(&Pairing::bye(t.id(), t.round(), home)).await?;
        }
        Ok(())
    }

    /// Moves to the next round once every pairing of this one is resolved.
    /// The caller holds the tournament's lock.
    async fn progress(&self, t: &mut Tournament) -> Result<(), Error> {
        let round = self
            .repo
            .pairings(t.id())
            .await?
            .into_iter()
            .filter(|p| p.round() == t.round())
            .collect::<Vec<_>>();
        if round.iter().any(|p| !p.is_resolved()) {
            return Ok(());
        }
        let survivors = self
            .repo
            .entrants(t.id())
            .await?
            .into_iter()
            .filter(|e| !e.eliminated())
            .map(|e| e.account())
            .collect::<Vec<_>>();
        match survivors.as_slice() {
            [winner] => self.crown(t, *winner).await,
            [] => Err(Error::transition("no survivors left")),
            _ => {
                let mut next = t.clone();
                next.next_round()?;
                self.repo.update(&next).await?;
                *t = next;
                log::info!("[tournament] {} round {} with {} players", t.id(), t.round(), survivors.len());
                self.schedule(t, &survivors).await
            }
        }
    }

    /// Pays the pool to `winner` and places everyone still standing.
    /// The caller holds the tournament's lock.
    async fn crown(&self, t: &mut Tournament, winner: ID<Account>) -> Result<(), Error> {
        let entrants = self.repo.entrants(t.id()).await?;
        if !entrants.iter().any(|e| e.account() == winner && !e.eliminated()) {
            return Err(Error::NotAParticipant);
        }
        let mut next = t.clone();
        let prize = next.conclude(winner)?;
        self.repo.update(&next).await?;
        *t = next;
        for mut entrant in entrants.into_iter().filter(|e| !e.eliminated()) {
            entrant.place(if entrant.account() == winner { 1 } else { 2 });
            self.repo.place(&entrant).await?;
        }
        if prize.is_positive() {
            let profit = prize.checked_sub(t.fee()).unwrap_or(Amount::ZERO);
            let _ = self.ledger.award(winner, prize, profit).await;
        }
        log::info!("[tournament] {} won by {} for {} SOL", t.id(), winner, prize);
        Ok(())
    }

    /// Applies one finished bracket game to its tournament.
    async fn record(&self, game: &Game) -> Result<(), Error> {
        let Some(mut pairing) = self.repo.pairing(game.id()).await? else {
            return Ok(());
        };
        let cell = self.cell(pairing.tournament()).await?;
        let mut t = cell.lock().await;
        if t.status() != TournamentStatus::Active || pairing.round() != t.round() {
            return Ok(());
        }
        match (game.status(), game.winner()) {
            (Status::Completed, Some(winner)) => {
                pairing.resolve(winner)?;
                self.repo.repair(&pairing).await?;
                if let Some(loser) = pairing.loser() {
                    let entrants = self.repo.entrants(t.id()).await?;
                    let standing = entrants.iter().filter(|e| !e.eliminated()).count() as i32;
                    if let Some(mut entrant) = entrants.into_iter().find(|e| e.account() == loser) {
                        entrant.eliminate(standing);
                        self.repo.place(&entrant).await?;
                    }
                }
                log::info!("[tournament] {} round {}: {} advances", t.id(), t.round(), winner);
                self.progress(&mut t).await
            }
            _ => {
                let away = pairing.away().ok_or_else(|| Error::transition("bye has no game"))?;
                let replay = self.registry.pair(pairing.home(), away, t.control()).await?;
                pairing.rematch(&replay);
                self.repo.repair(&pairing).await?;
                log::info!("[tournament] {} round {}: rematch in {}", t.id(), t.round(), replay.id());
                Ok(())
            }
        }
    }
}

impl Tournaments {
    pub async fn create(
        &self,
        organizer: ID<Account>,
        name: &str,
        description: &str,
        fee: Amount,
        capacity: i32,
        control: TimeControl,
    ) -> Result<Tournament, Error> {
        self.ledger.account(organizer).await?;
        let tournament = Tournament::new(organizer, name, description, fee, capacity, control)?;
        self.repo.create(&tournament).await?;
        log::info!("[tournament] {} created {} ({})", organizer, tournament.id(), tournament.name());
        Ok(tournament)
    }

    /// Registers `account`, debiting the entry fee into the pool.
    /// Reaching capacity starts the tournament. The entry stands even if
    /// starting fails; the organizer can start it later.
    pub async fn join(&self, id: ID<Tournament>, account: ID<Account>) -> Result<Tournament, Error> {
        let cell = self.cell(id).await?;
        let mut t = cell.lock().await;
        let entrants = self.repo.entrants(id).await?;
        if entrants.iter().any(|e| e.account() == account) {
            return Err(Error::AlreadyJoined);
        }
        let mut next = t.clone();
        next.admit()?;
        if t.fee().is_positive() {
            self.ledger.debit(account, t.fee()).await?;
        }
        let entrant = Entrant::new(id, account, next.entrants());
        if let Err(e) = self.repo.enter(&next, &entrant).await {
            if t.fee().is_positive() {
                let _ = self.ledger.refund(account, t.fee(), "tournament entry rollback").await;
            }
            return Err(e);
        }
        *t = next;
        log::info!("[tournament] {} joined {} ({}/{})", account, id, t.entrants(), t.capacity());
        if t.is_full() {
            if let Err(e) = self.begin(&mut t).await {
                log::error!("[tournament] {} filled but failed to start: {:?}", id, e);
            }
        }
        Ok(t.clone())
    }

    /// Starts early with whoever has joined. Organizer only.
    pub async fn start(&self, id: ID<Tournament>, by: ID<Account>) -> Result<Tournament, Error> {
        let cell = self.cell(id).await?;
        let mut t = cell.lock().await;
        if t.organizer() != by {
            return Err(Error::Unauthorized);
        }
        self.begin(&mut t).await?;
        Ok(t.clone())
    }

    /// Ends the tournament in favor of `winner`, who must still be standing.
    /// Organizer only.
    pub async fn conclude(
        &self,
        id: ID<Tournament>,
        by: ID<Account>,
        winner: ID<Account>,
    ) -> Result<Tournament, Error> {
        let cell = self.cell(id).await?;
        let mut t = cell.lock().await;
        if t.organizer() != by {
            return Err(Error::Unauthorized);
        }
        self.crown(&mut t, winner).await?;
        Ok(t.clone())
    }

    /// Calls off an open tournament, refunding every entrant. Organizer only.
    pub async fn cancel(&self, id: ID<Tournament>, by: ID<Account>) -> Result<Tournament, Error> {
        let cell = self.cell(id).await?;
        let mut t = cell.lock().await;
        if t.organizer() != by {
            return Err(Error::Unauthorized);
        }
        let mut next = t.clone();
        let fee = next.cancel()?;
        self.repo.update(&next).await?;
        *t = next;
        if fee.is_positive() {
            for entrant in self.repo.entrants(id).await? {
                let _ = self
                    .ledger
                    .refund(entrant.account(), fee, &format!("tournament {} cancelled", id))
                    .await;
            }
        }
        log::info!("[tournament] {} cancelled", id);
        Ok(t.clone())
    }

    pub async fn get(&self, id: ID<Tournament>) -> Result<Bracket, Error> {
        let tournament = self.cell(id).await?.lock().await.clone();
        Ok(Bracket {
            entrants: self.repo.entrants(id).await?,
            pairings: self.repo.pairings(id).await?,
            tournament,
        })
    }

    pub async fn list(&self) -> Result<Vec<Tournament>, Error> {
        self.repo.list(LISTING_LIMIT).await
    }

    /// The most recently completed tournaments, each with its winner.
    pub async fn champions(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
        self.repo.champions(limit).await
    }

    pub async fn running(&self) -> Result<i64, Error> {
        self.repo.running().await
    }
}

#[async_trait::async_trait]
impl Observer for Tournaments {
    async fn finished(&self, game: &Game) {
        if !game.is_bracket() {
            return;
        }
        if let Err(e) = self.record(game).await {
            log::error!("[tournament] failed to record result of {}: {:?}", game.id(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol(s: &str) -> Amount {
        s.parse().unwrap()
    }

    struct Stage {
        ledger: Ledger,
        registry: Arc<Registry>,
        engine: Arc<Tournaments>,
    }

    impl Stage {
        async fn new() -> Self {
            Self::with_repo(Arc::new(MemoryTournaments::default())).await
        }
        async fn with_repo(repo: Arc<dyn TournamentRepository>) -> Self {
            let ledger = Ledger::new(Arc::new(MemoryVault::default()));
            let registry = Arc::new(Registry::new(
                ledger.clone(),
                Arc::new(MemoryGames::default()),
                Arc::new(Permissive),
            ));
            let engine = Arc::new(Tournaments::new(
                ledger.clone(),
                registry.clone(),
                repo,
            ));
            engine.attach().await;
            Self {
                ledger,
                registry,
                engine,
            }
        }
        async fn player(&self, name: &str, balance: &str) -> ID<Account> {
            let id = self.ledger.open(name, name).await.unwrap().id();
            if sol(balance).is_positive() {
                self.ledger.credit(id, sol(balance)).await.unwrap();
            }
            id
        }
        async fn balance(&self, id: ID<Account>) -> Amount {
            self.ledger.balance(id).await.unwrap()
        }
        async fn cup(&self, organizer: ID<Account>, capacity: i32) -> ID<Tournament> {
            self.engine
                .create(organizer, "Friday Cup", "blitz", sol("1"), capacity, TimeControl::default())
                .await
                .unwrap()
                .id()
        }
        /// Settles the live game of `pairing` for `winner`.
        async fn win(&self, pairing: &Pairing, winner: ID<Account>) {
            let game = pairing.game().unwrap();
            let outcome = match winner == pairing.home() {
                true => Outcome::CreatorWins,
                false => Outcome::OpponentWins,
            };
            self.registry.settle(game, outcome).await.unwrap();
        }
        async fn open_pairings(&self, id: ID<Tournament>) -> Vec<Pairing> {
            let bracket = self.engine.get(id).await.unwrap();
            bracket
                .pairings
                .into_iter()
                .filter(|p| p.round() == bracket.tournament.round() && !p.is_resolved())
                .collect()
        }
    }

    #[tokio::test]
    async fn entry_fees_fill_the_pool() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let id = stage.cup(org, 4).await;
        stage.engine.join(id, a).await.unwrap();
        let t = stage.engine.join(id, b).await.unwrap();
        assert_eq!((t.entrants(), t.pool()), (2, sol("2")));
        assert_eq!(stage.balance(a).await, sol("4"));
        assert_eq!(stage.engine.join(id, a).await.unwrap_err(), Error::AlreadyJoined);
        assert_eq!(stage.engine.get(id).await.unwrap().tournament.pool(), sol("2"));
    }

    #[tokio::test]
    async fn broke_players_cannot_enter() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let poor = stage.player("poor", "0.5").await;
        let id = stage.cup(org, 4).await;
        assert_eq!(stage.engine.join(id, poor).await.unwrap_err(), Error::InsufficientFunds);
        assert_eq!(stage.engine.get(id).await.unwrap().tournament.entrants(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_cap_at_capacity() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let id = stage.cup(org, 4).await;
        let mut players = Vec::new();
        for i in 0..10 {
            players.push(stage.player(&format!("p{}", i), "1").await);
        }
        let results = futures::future::join_all(players.iter().map(|&p| {
            let engine = stage.engine.clone();
            tokio::spawn(async move { engine.join(id, p).await })
        }))
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
        for r in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(*r, Error::TournamentFull);
        }
        let bracket = stage.engine.get(id).await.unwrap();
        assert_eq!(bracket.entrants.len(), 4);
        assert_eq!(bracket.tournament.pool(), sol("4"));
        assert_eq!(bracket.tournament.status(), TournamentStatus::Active);
    }

    /// Refuses the first tournament update, passing everything else through.
    #[derive(Default)]
    struct Stalled {
        inner: MemoryTournaments,
        refused: std::sync::atomic::AtomicBool,
    }
    #[async_trait::async_trait]
    impl TournamentRepository for Stalled {
        async fn create(&self, t: &Tournament) -> Result<(), Error> {
            self.inner.create(t).await
        }
        async fn update(&self, t: &Tournament) -> Result<(), Error> {
            use std::sync::atomic::Ordering;
            match self.refused.swap(true, Ordering::SeqCst) {
                false => Err(Error::Storage("connection reset".into())),
                true => self.inner.update(t).await,
            }
        }
        async fn fetch(&self, id: ID<Tournament>) -> Result<Option<Tournament>, Error> {
            self.inner.fetch(id).await
        }
        async fn list(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
            self.inner.list(limit).await
        }
        async fn champions(&self, limit: i64) -> Result<Vec<Tournament>, Error> {
            self.inner.champions(limit).await
        }
        async fn running(&self) -> Result<i64, Error> {
            self.inner.running().await
        }
        async fn enter(&self, t: &Tournament, entrant: &Entrant) -> Result<(), Error> {
            self.inner.enter(t, entrant).await
        }
        async fn entrants(&self, id: ID<Tournament>) -> Result<Vec<Entrant>, Error> {
            self.inner.entrants(id).await
        }
        async fn place(&self, entrant: &Entrant) -> Result<(), Error> {
            self.inner.place(entrant).await
        }
        async fn pair(&self, pairing: &Pairing) -> Result<(), Error> {
            self.inner.pair(pairing).await
        }
        async fn repair(&self, pairing: &Pairing) -> Result<(), Error> {
            self.inner.repair(pairing).await
        }
        async fn pairings(&self, id: ID<Tournament>) -> Result<Vec<Pairing>, Error> {
            self.inner.pairings(id).await
        }
        async fn pairing(&self, game: ID<Game>) -> Result<Option<Pairing>, Error> {
            self.inner.pairing(game).await
        }
    }

    #[tokio::test]
    async fn filling_join_stands_when_the_start_fails() {
        let stage = Stage::with_repo(Arc::new(Stalled::default())).await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let id = stage.cup(org, 2).await;
        stage.engine.join(id, a).await.unwrap();
        let t = stage.engine.join(id, b).await.unwrap();
        assert_eq!(t.status(), TournamentStatus::Open);
        assert_eq!((t.entrants(), t.pool()), (2, sol("2")));
        assert_eq!(stage.balance(b).await, sol("4"));
        assert_eq!(stage.engine.join(id, b).await.unwrap_err(), Error::AlreadyJoined);
        let t = stage.engine.start(id, org).await.unwrap();
        assert_eq!(t.status(), TournamentStatus::Active);
        assert_eq!(stage.open_pairings(id).await.len(), 1);
    }

    #[tokio::test]
    async fn only_the_organizer_starts_and_needs_two() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let id = stage.cup(org, 8).await;
        stage.engine.join(id, a).await.unwrap();
        assert_eq!(stage.engine.start(id, a).await.unwrap_err(), Error::Unauthorized);
        assert!(matches!(
            stage.engine.start(id, org).await,
            Err(Error::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn three_player_bracket_runs_to_payout() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let c = stage.player("carol", "5").await;
        let id = stage.cup(org, 3).await;
        for p in [a, b, c] {
            stage.engine.join(id, p).await.unwrap();
        }
        let bracket = stage.engine.get(id).await.unwrap();
        assert_eq!(bracket.tournament.status(), TournamentStatus::Active);
        assert_eq!(bracket.pairings.len(), 2);
        assert!(bracket.pairings.iter().any(|p| p.is_bye() && p.home() == c));

        let round1 = stage.open_pairings(id).await;
        assert_eq!(round1.len(), 1);
        stage.win(&round1[0], b).await;

        let round2 = stage.open_pairings(id).await;
        assert_eq!(round2.len(), 1);
        assert_eq!(stage.engine.get(id).await.unwrap().tournament.round(), 2);
        assert_eq!((round2[0].home(), round2[0].away()), (b, Some(c)));
        stage.win(&round2[0], c).await;

        let bracket = stage.engine.get(id).await.unwrap();
        assert_eq!(bracket.tournament.status(), TournamentStatus::Completed);
        assert_eq!(bracket.tournament.winner(), Some(c));
        assert_eq!(stage.balance(c).await, sol("7"));
        let placement = |who| {
            bracket
                .entrants
                .iter()
                .find(|e| e.account() == who)
                .and_then(Entrant::placement)
        };
        assert_eq!(placement(c), Some(1));
        assert_eq!(placement(b), Some(2));
        assert_eq!(placement(a), Some(3));
    }

    #[tokio::test]
    async fn drawn_bracket_games_are_replayed() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let id = stage.cup(org, 2).await;
        stage.engine.join(id, a).await.unwrap();
        stage.engine.join(id, b).await.unwrap();
        let first = stage.open_pairings(id).await.remove(0);
        stage.registry.settle(first.game().unwrap(), Outcome::Draw).await.unwrap();
        let replay = stage.open_pairings(id).await.remove(0);
        assert_ne!(replay.game(), first.game());
        assert_eq!(stage.engine.get(id).await.unwrap().tournament.round(), 1);
        stage.win(&replay, a).await;
        let t = stage.engine.get(id).await.unwrap().tournament;
        assert_eq!(t.winner(), Some(a));
        assert_eq!(stage.balance(a).await, sol("6"));
    }

    #[tokio::test]
    async fn cancellation_refunds_each_entrant() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let id = stage.cup(org, 4).await;
        stage.engine.join(id, a).await.unwrap();
        stage.engine.join(id, b).await.unwrap();
        assert_eq!(stage.engine.cancel(id, a).await.unwrap_err(), Error::Unauthorized);
        let t = stage.engine.cancel(id, org).await.unwrap();
        assert_eq!(t.status(), TournamentStatus::Cancelled);
        assert_eq!(stage.balance(a).await, sol("5"));
        assert_eq!(stage.balance(b).await, sol("5"));
        assert_eq!(stage.engine.join(id, org).await.unwrap_err(), Error::NotOpen);
    }

    #[tokio::test]
    async fn organizer_can_conclude_early() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let id = stage.cup(org, 4).await;
        stage.engine.join(id, a).await.unwrap();
        stage.engine.join(id, b).await.unwrap();
        assert!(matches!(
            stage.engine.conclude(id, org, a).await,
            Err(Error::InvalidTransition(_))
        ));
        stage.engine.start(id, org).await.unwrap();
        let stranger = stage.player("eve", "0").await;
        assert_eq!(
            stage.engine.conclude(id, org, stranger).await.unwrap_err(),
            Error::NotAParticipant
        );
        let t = stage.engine.conclude(id, org, b).await.unwrap();
        assert_eq!(t.winner(), Some(b));
        assert_eq!(stage.balance(b).await, sol("6"));
        assert_eq!(stage.ledger.account(b).await.unwrap().earnings(), sol("1"));
    }

    #[tokio::test]
    async fn champions_and_running_count() {
        let stage = Stage::new().await;
        let org = stage.player("org", "0").await;
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        let done = stage.cup(org, 2).await;
        let live = stage.cup(org, 2).await;
        let _open = stage.cup(org, 2).await;
        for id in [done, live] {
            stage.engine.join(id, a).await.unwrap();
            stage.engine.join(id, b).await.unwrap();
        }
        assert_eq!(stage.engine.running().await.unwrap(), 2);
        assert!(stage.engine.champions(10).await.unwrap().is_empty());
        stage.engine.conclude(done, org, a).await.unwrap();
        assert_eq!(stage.engine.running().await.unwrap(), 1);
        let champions = stage.engine.champions(10).await.unwrap();
        assert_eq!(champions.len(), 1);
        assert_eq!((champions[0].id(), champions[0].winner()), (done, Some(a)));
        assert_eq!(champions[0].pool(), sol("2"));
    }
}
