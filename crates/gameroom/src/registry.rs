use super::*;
use sm_core::*;
use sm_ledger::*;
use sm_rating::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

const LISTING_LIMIT: i64 = 100;
const HISTORY_LIMIT: i64 = 50;
const CHAT_BACKLOG: i64 = 200;

/// Owns every live game and serializes its transitions.
///
/// Each non-terminal game sits behind its own [`Mutex`], held across
/// validation, escrow and persistence, so two requests against the same
/// game never interleave while different games proceed in parallel.
/// Storage is written through on every transition; a game leaves memory
/// once it is terminal and is read back from the repository on demand.
pub struct Registry {
    ledger: Ledger,
    ratings: Ratings,
    repo: Arc<dyn GameRepository>,
    rules: Arc<dyn Rules>,
    games: RwLock<HashMap<ID<Game>, Arc<Mutex<Game>>>>,
    observers: RwLock<Vec<Weak<dyn Observer>>>,
}

impl Registry {
    pub fn new(ledger: Ledger, repo: Arc<dyn GameRepository>, rules: Arc<dyn Rules>) -> Self {
        Self {
            ratings: Ratings::new(ledger.clone()),
            ledger,
            repo,
            rules,
            games: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub async fn observe(&self, observer: Weak<dyn Observer>) {
        self.observers.write().await.push(observer);
    }

    /// Loads every non-terminal game from storage.
    pub async fn hydrate(&self) -> Result<usize, Error> {
        let live = self.repo.live().await?;
        let mut games = self.games.write().await;
        for game in live {
            games
                .entry(game.id())
                .or_insert_with(|| Arc::new(Mutex::new(game)));
        }
        log::info!("[registry] hydrated {} live games", games.len());
        Ok(games.len())
    }

    /// Snapshot of every game in memory that is currently being played.
    pub async fn active(&self) -> Vec<Game> {
        let cells = self.games.read().await.values().cloned().collect::<Vec<_>>();
        let mut active = Vec::new();
        for cell in cells {
            let game = cell.lock().await;
            if game.status() == Status::Active {
                active.push(game.clone());
            }
        }
        active
    }

    async fn cell(&self, id: ID<Game>) -> Result<Arc<Mutex<Game>>, Error> {
        if let Some(cell) = self.games.read().await.get(&id) {
            return Ok(cell.clone());
        }
        let game = self.repo.fetch(id).await?.ok_or(Error::NotFound)?;
        match game.status().is_terminal() {
            true => Ok(Arc::new(Mutex::new(game))),
            false => Ok(self
                .games
                .write()
                .await
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(game)))
                .clone()),
        }
    }

    /// Drops a terminal game from memory and tells the observers.
    async fn retire(&self, game: Game) {
        self.games.write().await.remove(&game.id());
        let observers = self
            .observers
            .read()
            .await
            .iter()
            .filter_map(Weak::upgrade)
            .collect::<Vec<_>>();
        for observer in observers {
            observer.finished(&game).await;
        }
    }

    async fn pay(&self, game: &Game, payouts: Vec<Payout>) {
        for payout in payouts {
            let _ = match payout {
                Payout::Prize { to, amount, profit } => self.ledger.award(to, amount, profit).await,
                Payout::Refund { to, amount } => {
                    self.ledger
                        .refund(to, amount, &format!("game {}", game.id()))
                        .await
                }
            };
        }
    }

    /// Settles `game` in place. The caller holds its lock.
    async fn conclude(&self, game: &mut Game, outcome: Outcome) -> Result<(), Error> {
        let mut next = game.clone();
        let payouts = next.settle(outcome)?;
        let rate = next.rate();
        self.repo.update(&next).await?;
        *game = next;
        log::info!("[registry] game {} settled: {:?}", game.id(), outcome);
        self.pay(game, payouts).await;
        if let (true, Some(opponent)) = (rate, game.opponent()) {
            let score = match outcome {
                Outcome::CreatorWins => Score::Win,
                Outcome::OpponentWins => Score::Loss,
                Outcome::Draw => Score::Draw,
            };
            if let Err(e) = self.ratings.update(game.creator(), opponent, score).await {
                log::error!("[registry] rating update for {} failed: {:?}", game.id(), e);
            }
        }
        Ok(())
    }

    /// Cancels `game` in place. The caller holds its lock.
    async fn void(&self, game: &mut Game, reason: Reason) -> Result<(), Error> {
        let mut next = game.clone();
        let refunds = next.cancel(reason)?;
        self.repo.update(&next).await?;
        *game = next;
        log::info!("[registry] game {} cancelled: {:?}", game.id(), reason);
        self.pay(game, refunds).await;
        Ok(())
    }
}

impl Registry {
    pub async fn game(&self, id: ID<Game>) -> Result<Game, Error> {
        Ok(self.cell(id).await?.lock().await.clone())
    }

    /// Escrows `wager` from `creator` and opens a game.
    pub async fn create(
        &self,
        creator: ID<Account>,
        wager: Amount,
        control: TimeControl,
    ) -> Result<Game, Error> {
        if wager < MIN_WAGER || wager > MAX_WAGER {
            return Err(Error::invalid(format!(
                "wager must lie between {} and {} SOL",
                MIN_WAGER, MAX_WAGER
            )));
        }
        self.ledger.debit(creator, wager).await?;
        let game = Game::new(creator, wager, control);
        if let Err(e) = self.repo.create(&game).await {
            let _ = self.ledger.refund(creator, wager, "game creation rollback").await;
            return Err(e);
        }
        self.games
            .write()
            .await
            .insert(game.id(), Arc::new(Mutex::new(game.clone())));
        log::info!("[registry] {} opened game {} for {} SOL", creator, game.id(), wager);
        Ok(game)
    }

    /// Starts a zero-wager bracket game between two tournament players.
    pub async fn pair(
        &self,
        creator: ID<Account>,
        opponent: ID<Account>,
        control: TimeControl,
    ) -> Result<Game, Error> {
        if creator == opponent {
            return Err(Error::SelfJoin);
        }
        let game = Game::bracket(creator, opponent, control);
        self.repo.create(&game).await?;
        self.games
            .write()
            .await
            .insert(game.id(), Arc::new(Mutex::new(game.clone())));
        log::info!("[registry] paired {} vs {} in {}", creator, opponent, game.id());
        Ok(game)
    }

    /// Escrows the matching wager from `opponent` and starts the game.
    /// The rating gap is reported, never enforced.
    pub async fn join(&self, id: ID<Game>, opponent: ID<Account>) -> Result<Joined, Error> {
        let cell = self.cell(id).await?;
        let mut game = cell.lock().await;
        let mut next = game.clone();
        next.join(opponent)?;
        self.ledger.debit(opponent, game.wager()).await?;
        if let Err(e) = self.repo.update(&next).await {
            let _ = self
                .ledger
                .refund(opponent, game.wager(), "game join rollback")
                .await;
            return Err(e);
        }
        *game = next;
        let gap = match (
            self.ledger.account(game.creator()).await,
            self.ledger.account(opponent).await,
        ) {
            (Ok(a), Ok(b)) => (a.rating() - b.rating()).abs(),
            _ => 0,
        };
        if gap > MAX_RATING_GAP {
            log::info!("[registry] {} joined {} across a {} point gap", opponent, id, gap);
        } else {
            log::info!("[registry] {} joined {}", opponent, id);
        }
        Ok(Joined {
            game: game.clone(),
            gap,
            matched: gap <= MAX_RATING_GAP,
        })
    }

    /// Validates turn order, consults the rules oracle and persists the move.
    /// A game-over verdict settles the game before returning.
    pub async fn record_move(
        &self,
        id: ID<Game>,
        mover: ID<Account>,
        notation: &str,
    ) -> Result<Played, Error> {
        let played = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            game.check(mover)?;
            let verdict = self.rules.apply(game.position(), notation, game.ply())?;
            let mut next = game.clone();
            let entry = next.advance(mover, notation.trim(), verdict.position);
            self.repo.record(&next, &entry).await?;
            *game = next;
            log::debug!("[registry] {} ply {} by {}: {}", id, entry.ply(), mover, entry.notation());
            if let Some(ending) = verdict.ending {
                let outcome = match (ending, mover == game.creator()) {
                    (Ending::Draw, _) => Outcome::Draw,
                    (Ending::MoverWins, true) => Outcome::CreatorWins,
                    (Ending::MoverWins, false) => Outcome::OpponentWins,
                };
                self.conclude(&mut game, outcome).await?;
            }
            Played {
                entry,
                game: game.clone(),
            }
        };
        if played.game.status().is_terminal() {
            self.retire(played.game.clone()).await;
        }
        Ok(played)
    }

    pub async fn settle(&self, id: ID<Game>, outcome: Outcome) -> Result<Game, Error> {
        let game = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            self.conclude(&mut game, outcome).await?;
            game.clone()
        };
        self.retire(game.clone()).await;
        Ok(game)
    }

    /// The resigning participant's opponent wins.
    pub async fn resign(&self, id: ID<Game>, account: ID<Account>) -> Result<Game, Error> {
        let game = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            if !game.is_participant(account) {
                return Err(Error::NotAParticipant);
            }
            let outcome = match account == game.creator() {
                true => Outcome::OpponentWins,
                false => Outcome::CreatorWins,
            };
            self.conclude(&mut game, outcome).await?;
            game.clone()
        };
        self.retire(game.clone()).await;
        Ok(game)
    }

    pub async fn cancel(&self, id: ID<Game>, reason: Reason) -> Result<Game, Error> {
        let game = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            self.void(&mut game, reason).await?;
            game.clone()
        };
        self.retire(game.clone()).await;
        Ok(game)
    }

    /// The creator takes back an unmatched game.
    pub async fn withdraw(&self, id: ID<Game>, account: ID<Account>) -> Result<Game, Error> {
        let game = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            if game.creator() != account {
                return Err(Error::NotAParticipant);
            }
            self.void(&mut game, Reason::Withdrawn).await?;
            game.clone()
        };
        self.retire(game.clone()).await;
        Ok(game)
    }

    /// `absent` never came back. Wagered games are cancelled with both
    /// stakes refunded; bracket games are forfeited to the player still here.
    pub async fn abandon(&self, id: ID<Game>, absent: ID<Account>) -> Result<Game, Error> {
        let game = {
            let cell = self.cell(id).await?;
            let mut game = cell.lock().await;
            if !game.is_participant(absent) {
                return Err(Error::NotAParticipant);
            }
            match game.is_bracket() {
                true if absent == game.creator() => {
                    self.conclude(&mut game, Outcome::OpponentWins).await?
                }
                true => self.conclude(&mut game, Outcome::CreatorWins).await?,
                false => self.void(&mut game, Reason::Abandoned).await?,
            }
            game.clone()
        };
        self.retire(game.clone()).await;
        Ok(game)
    }

    /// Unmatched games with their creator's name and rating, plus the
    /// rating gap to `viewer` when one is given.
    pub async fn open_games(&self, viewer: Option<ID<Account>>) -> Result<Vec<Listing>, Error> {
        let rating = match viewer {
            Some(id) => Some(self.ledger.account(id).await?.rating()),
            None => None,
        };
        let mut listings = Vec::new();
        for game in self.repo.waiting(LISTING_LIMIT).await? {
            let creator = self.ledger.account(game.creator()).await?;
            listings.push(Listing::new(
                game,
                creator.name().to_string(),
                creator.rating(),
                rating,
            ));
        }
        Ok(listings)
    }

    pub async fn history(&self, account: ID<Account>) -> Result<Vec<Game>, Error> {
        self.repo.history(account, HISTORY_LIMIT).await
    }

    /// Move log after ply `since`, or the whole log.
    pub async fn tally(&self) -> Result<Tally, Error> {
        self.repo.tally().await
    }

    pub async fn moves(&self, id: ID<Game>, since: Option<Ply>) -> Result<Vec<Move>, Error> {
        self.cell(id).await?;
        self.repo.moves(id, since).await
    }

    pub async fn post_chat(
        &self,
        id: ID<Game>,
        author: ID<Account>,
        text: &str,
    ) -> Result<ChatMessage, Error> {
        if !self.game(id).await?.is_participant(author) {
            return Err(Error::NotAParticipant);
        }
        let message = ChatMessage::new(id, author, text)?;
        self.repo.chat(&message).await?;
        Ok(message)
    }

    pub async fn chat(&self, id: ID<Game>, viewer: ID<Account>) -> Result<Vec<ChatMessage>, Error> {
        if !self.game(id).await?.is_participant(viewer) {
            return Err(Error::NotAParticipant);
        }
        self.repo.chats(id, CHAT_BACKLOG).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    fn sol(s: &str) -> Amount {
        s.parse().unwrap()
    }

    struct Stage {
        ledger: Ledger,
        repo: Arc<MemoryGames>,
        registry: Arc<Registry>,
    }

    impl Stage {
        fn new() -> Self {
            Self::with_rules(Arc::new(Permissive))
        }
        fn with_rules(rules: Arc<dyn Rules>) -> Self {
            let ledger = Ledger::new(Arc::new(MemoryVault::default()));
            let repo = Arc::new(MemoryGames::default());
            let registry = Arc::new(Registry::new(ledger.clone(), repo.clone(), rules));
            Self {
                ledger,
                repo,
                registry,
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
        async fn matched(&self, wager: &str) -> (ID<Game>, ID<Account>, ID<Account>) {
            let a = self.player("alice", "5").await;
            let b = self.player("bob", "5").await;
            let game = self
                .registry
                .create(a, sol(wager), TimeControl::default())
                .await
                .unwrap();
            self.registry.join(game.id(), b).await.unwrap();
            (game.id(), a, b)
        }
    }

    /// Ends the game whenever the move is written `#`.
    struct Mates;
    impl Rules for Mates {
        fn apply(&self, position: &str, notation: &str, _: Ply) -> Result<Verdict, Error> {
            Ok(Verdict {
                position: format!("{} {}", position, notation),
                ending: notation.ends_with('#').then_some(Ending::MoverWins),
            })
        }
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);
    #[async_trait::async_trait]
    impl Observer for Counter {
        async fn finished(&self, _: &Game) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn create_then_withdraw_restores_balance() {
        let stage = Stage::new();
        let a = stage.player("alice", "3").await;
        let game = stage
            .registry
            .create(a, sol("1.5"), TimeControl::default())
            .await
            .unwrap();
        assert_eq!(stage.balance(a).await, sol("1.5"));
        let game = stage.registry.withdraw(game.id(), a).await.unwrap();
        assert_eq!(game.status(), Status::Cancelled);
        assert_eq!(stage.balance(a).await, sol("3"));
    }

    #[tokio::test]
    async fn create_validates_wager_and_funds() {
        let stage = Stage::new();
        let a = stage.player("alice", "1").await;
        let create = |w: &str| stage.registry.create(a, sol(w), TimeControl::default());
        assert!(matches!(create("0.001").await, Err(Error::InvalidInput(_))));
        assert!(matches!(create("101").await, Err(Error::InvalidInput(_))));
        assert_eq!(create("2").await.unwrap_err(), Error::InsufficientFunds);
        assert!(stage.registry.open_games(None).await.unwrap().is_empty());
        assert_eq!(stage.balance(a).await, sol("1"));
    }

    #[tokio::test]
    async fn one_sol_game_creator_wins() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        assert_eq!(stage.balance(a).await, sol("4"));
        assert_eq!(stage.balance(b).await, sol("4"));
        let game = stage.registry.settle(id, Outcome::CreatorWins).await.unwrap();
        assert_eq!(game.winner(), Some(a));
        assert!(game.rated());
        assert_eq!(stage.balance(a).await, sol("6"));
        assert_eq!(stage.balance(b).await, sol("4"));
        let alice = stage.ledger.account(a).await.unwrap();
        let bob = stage.ledger.account(b).await.unwrap();
        assert_eq!((alice.rating(), alice.wins(), alice.earnings()), (1220, 1, sol("1")));
        assert_eq!((bob.rating(), bob.games()), (1180, 1));
    }

    #[tokio::test]
    async fn point_three_wager_between_one_sol_players() {
        let stage = Stage::new();
        let a = stage.player("alice", "1").await;
        let b = stage.player("bob", "1").await;
        let game = stage
            .registry
            .create(a, sol("0.3"), TimeControl::default())
            .await
            .unwrap();
        assert_eq!(stage.balance(a).await, sol("0.7"));
        let joined = stage.registry.join(game.id(), b).await.unwrap();
        assert_eq!(joined.game.status(), Status::Active);
        assert_eq!(stage.balance(b).await, sol("0.7"));
        let game = stage.registry.settle(game.id(), Outcome::CreatorWins).await.unwrap();
        assert_eq!(game.winner(), Some(a));
        assert_eq!(stage.balance(a).await, sol("1.3"));
        assert_eq!(stage.balance(b).await, sol("0.7"));
        let alice = stage.ledger.account(a).await.unwrap();
        assert_eq!((alice.rating(), alice.earnings()), (1220, sol("0.3")));
        assert_eq!(stage.ledger.account(b).await.unwrap().rating(), 1180);
    }

    #[tokio::test]
    async fn double_settle_is_rejected() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        stage.registry.settle(id, Outcome::OpponentWins).await.unwrap();
        assert_eq!(
            stage.registry.settle(id, Outcome::CreatorWins).await.unwrap_err(),
            Error::AlreadySettled
        );
        assert_eq!(stage.balance(a).await, sol("4"));
        assert_eq!(stage.balance(b).await, sol("6"));
        assert_eq!(stage.ledger.account(b).await.unwrap().games(), 1);
    }

    #[tokio::test]
    async fn draw_refunds_both_wagers() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("2").await;
        stage.registry.settle(id, Outcome::Draw).await.unwrap();
        assert_eq!(stage.balance(a).await, sol("5"));
        assert_eq!(stage.balance(b).await, sol("5"));
    }

    #[tokio::test]
    async fn join_rejections_leave_balances_alone() {
        let stage = Stage::new();
        let a = stage.player("alice", "5").await;
        let poor = stage.player("poor", "0.5").await;
        let game = stage
            .registry
            .create(a, sol("1"), TimeControl::default())
            .await
            .unwrap();
        assert_eq!(stage.registry.join(game.id(), a).await.unwrap_err(), Error::SelfJoin);
        assert_eq!(
            stage.registry.join(game.id(), poor).await.unwrap_err(),
            Error::InsufficientFunds
        );
        assert_eq!(stage.registry.game(game.id()).await.unwrap().status(), Status::Waiting);
        assert_eq!(stage.balance(poor).await, sol("0.5"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_admit_one_opponent() {
        let stage = Stage::new();
        let a = stage.player("alice", "5").await;
        let game = stage
            .registry
            .create(a, sol("1"), TimeControl::default())
            .await
            .unwrap();
        let mut joiners = Vec::new();
        for i in 0..8 {
            joiners.push(stage.player(&format!("p{}", i), "1").await);
        }
        let results = futures::future::join_all(joiners.iter().map(|&p| {
            let registry = stage.registry.clone();
            let game_id = game.id();
            tokio::spawn(async move { registry.join(game_id, p).await })
        }))
        .await;
        let joined = results.iter().filter(|r| r.as_ref().unwrap().is_ok()).count();
        assert_eq!(joined, 1);
        for r in results.iter().map(|r| r.as_ref().unwrap()) {
            if let Err(e) = r {
                assert_eq!(*e, Error::GameNotJoinable);
            }
        }
        let mut spent = 0;
        for p in joiners {
            if stage.balance(p).await == Amount::ZERO {
                spent += 1;
            }
        }
        assert_eq!(spent, 1);
    }

    #[tokio::test]
    async fn moves_follow_turn_order_and_persist() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        let outsider = stage.player("eve", "0").await;
        assert_eq!(
            stage.registry.record_move(id, b, "e7e5").await.unwrap_err(),
            Error::OutOfTurn
        );
        assert_eq!(
            stage.registry.record_move(id, outsider, "e2e4").await.unwrap_err(),
            Error::NotAParticipant
        );
        stage.registry.record_move(id, a, "e2e4").await.unwrap();
        stage.registry.record_move(id, b, "e7e5").await.unwrap();
        let played = stage.registry.record_move(id, a, "g1f3").await.unwrap();
        assert_eq!(played.entry.ply(), 2);
        assert_eq!(played.game.ply(), 3);
        let since = stage.registry.moves(id, Some(0)).await.unwrap();
        assert_eq!(
            since.iter().map(|m| m.notation()).collect::<Vec<_>>(),
            vec!["e7e5", "g1f3"]
        );
        assert_eq!(stage.registry.moves(id, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn illegal_moves_are_not_recorded() {
        let stage = Stage::new();
        let (id, a, _) = stage.matched("1").await;
        assert!(matches!(
            stage.registry.record_move(id, a, "").await,
            Err(Error::IllegalMove(_))
        ));
        assert_eq!(stage.registry.game(id).await.unwrap().ply(), 0);
        assert!(stage.registry.moves(id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oracle_game_over_settles_and_notifies_once() {
        let stage = Stage::with_rules(Arc::new(Mates));
        let counter = Arc::new(Counter::default());
        let observer: Arc<dyn Observer> = counter.clone();
        stage.registry.observe(Arc::downgrade(&observer)).await;
        let (id, a, b) = stage.matched("1").await;
        stage.registry.record_move(id, a, "f2f3").await.unwrap();
        let played = stage.registry.record_move(id, b, "d8h4#").await.unwrap();
        assert_eq!(played.game.status(), Status::Completed);
        assert_eq!(played.game.winner(), Some(b));
        assert_eq!(stage.balance(b).await, sol("6"));
        assert_eq!(
            stage.registry.record_move(id, a, "g2g4").await.unwrap_err(),
            Error::AlreadySettled
        );
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resignation_hands_opponent_the_pot() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        let outsider = stage.player("eve", "0").await;
        assert_eq!(
            stage.registry.resign(id, outsider).await.unwrap_err(),
            Error::NotAParticipant
        );
        let game = stage.registry.resign(id, b).await.unwrap();
        assert_eq!(game.winner(), Some(a));
        assert_eq!(stage.balance(a).await, sol("6"));
    }

    #[tokio::test]
    async fn abandonment_refunds_wagered_games() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        let game = stage.registry.abandon(id, b).await.unwrap();
        assert_eq!(game.status(), Status::Cancelled);
        assert_eq!(stage.balance(a).await, sol("5"));
        assert_eq!(stage.balance(b).await, sol("5"));
        assert_eq!(stage.ledger.account(a).await.unwrap().games(), 0);
    }

    #[tokio::test]
    async fn abandonment_forfeits_bracket_games() {
        let stage = Stage::new();
        let a = stage.player("alice", "0").await;
        let b = stage.player("bob", "0").await;
        let game = stage.registry.pair(a, b, TimeControl::default()).await.unwrap();
        let game = stage.registry.abandon(game.id(), a).await.unwrap();
        assert_eq!(game.status(), Status::Completed);
        assert_eq!(game.winner(), Some(b));
        assert_eq!(stage.balance(b).await, Amount::ZERO);
    }

    #[tokio::test]
    async fn withdraw_needs_creator_and_waiting_game() {
        let stage = Stage::new();
        let (id, _, b) = stage.matched("1").await;
        assert_eq!(
            stage.registry.withdraw(id, b).await.unwrap_err(),
            Error::NotAParticipant
        );
        assert!(matches!(
            stage.registry.cancel(id, Reason::Withdrawn).await,
            Err(Error::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn chat_is_for_participants() {
        let stage = Stage::new();
        let (id, a, b) = stage.matched("1").await;
        let outsider = stage.player("eve", "0").await;
        stage.registry.post_chat(id, a, "good luck").await.unwrap();
        stage.registry.post_chat(id, b, "you too").await.unwrap();
        assert_eq!(
            stage.registry.post_chat(id, outsider, "hi").await.unwrap_err(),
            Error::NotAParticipant
        );
        assert!(stage.registry.post_chat(id, a, "").await.is_err());
        let log = stage.registry.chat(id, b).await.unwrap();
        assert_eq!(
            log.iter().map(|m| m.text()).collect::<Vec<_>>(),
            vec!["good luck", "you too"]
        );
        assert_eq!(stage.registry.chat(id, outsider).await.unwrap_err(), Error::NotAParticipant);
    }

    #[tokio::test]
    async fn listings_report_rating_gap_without_enforcing_it() {
        let stage = Stage::new();
        let a = stage.player("alice", "5").await;
        let b = stage.player("bob", "5").await;
        stage.ledger.seed(a, 1800).await.unwrap();
        let game = stage
            .registry
            .create(a, sol("1"), TimeControl::default())
            .await
            .unwrap();
        let listings = stage.registry.open_games(Some(b)).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].creator_rating, 1800);
        assert_eq!(listings[0].gap, Some(600));
        assert!(!listings[0].matched);
        let joined = stage.registry.join(game.id(), b).await.unwrap();
        assert_eq!(joined.gap, 600);
        assert!(stage.registry.open_games(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hydrate_resumes_live_games() {
        let stage = Stage::new();
        let (id, a, _) = stage.matched("1").await;
        stage.registry.record_move(id, a, "e2e4").await.unwrap();
        let restarted = Registry::new(stage.ledger.clone(), stage.repo.clone(), Arc::new(Permissive));
        assert_eq!(restarted.hydrate().await.unwrap(), 1);
        let game = restarted.game(id).await.unwrap();
        assert_eq!((game.status(), game.ply()), (Status::Active, 1));
        let active = restarted.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), id);
    }

    #[tokio::test]
    async fn tally_counts_games_and_completed_volume() {
        let stage = Stage::new();
        let (won, _, _) = stage.matched("1").await;
        let (drawn, _, _) = stage.matched("2").await;
        let a = stage.player("carol", "1").await;
        stage
            .registry
            .create(a, sol("0.5"), TimeControl::default())
            .await
            .unwrap();
        stage.registry.settle(won, Outcome::CreatorWins).await.unwrap();
        stage.registry.settle(drawn, Outcome::Draw).await.unwrap();
        let tally = stage.registry.tally().await.unwrap();
        assert_eq!(tally.games, 3);
        assert_eq!(tally.volume, sol("3"));
    }
}
