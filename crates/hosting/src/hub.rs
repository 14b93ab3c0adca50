use super::*;
use sm_auth::*;
use sm_core::*;
use sm_gameroom::*;
use sm_ledger::Account;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One WebSocket, authenticated or not.
pub struct Connection {
    id: ID<Self>,
    tx: Tx,
    account: Option<ID<Account>>,
}

impl Unique for Connection {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

impl Connection {
    pub fn account(&self) -> Option<ID<Account>> {
        self.account
    }
    fn send(&self, message: &ServerMessage) {
        let _ = self.tx.send(message.to_json());
    }
    fn who(&self) -> Result<ID<Account>, Error> {
        self.account.ok_or(Error::Unauthorized)
    }
}

/// Routes realtime traffic between players and the [`Registry`].
///
/// Moves and chat are persisted through the registry before they are
/// forwarded, so a reconnecting client can always catch up from storage.
/// All routing state lives in one [`Table`] behind one lock.
pub struct Hub {
    registry: Arc<Registry>,
    authority: Arc<Authority>,
    table: Mutex<Table>,
    grace: Duration,
}

impl Hub {
    pub fn new(registry: Arc<Registry>, authority: Arc<Authority>, grace: Duration) -> Self {
        Self {
            registry,
            authority,
            table: Mutex::new(Table::default()),
            grace,
        }
    }

    /// Registers a fresh socket whose outbound frames go to `tx`.
    pub fn connect(&self, tx: Tx) -> Connection {
        let conn = Connection {
            id: ID::default(),
            tx,
            account: None,
        };
        conn.send(&ServerMessage::Connected);
        log::debug!("[hub] connection {} opened", conn.id);
        conn
    }

    /// Handles one text frame. Failures are reported to the sender only.
    pub async fn handle(&self, conn: &mut Connection, text: &str) {
        let result = match ClientMessage::try_from(text) {
            Ok(ClientMessage::Auth { token, account, since }) => {
                self.authenticate(conn, &token, account, since).await
            }
            Ok(ClientMessage::JoinGame { game, since }) => self.join_room(conn, game, since).await,
            Ok(ClientMessage::ChatMessage { content }) => self.relay_chat(conn, &content).await,
            Ok(ClientMessage::GameMove { notation }) => self.relay_move(conn, &notation).await,
            Ok(ClientMessage::Resign) => self.resign(conn).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            log::debug!("[hub] connection {} rejected: {:?}", conn.id, e);
            conn.send(&ServerMessage::error(&e));
        }
    }

    /// Binds `conn` to the token's account. If the account was inside its
    /// grace period, the timer stops and the room is restored.
    pub async fn authenticate(
        &self,
        conn: &mut Connection,
        token: &str,
        claimed: Option<ID<Account>>,
        since: Option<Ply>,
    ) -> Result<(), Error> {
        let claims = self.authority.verify(token).await?;
        let account = claims.account();
        if claimed.is_some_and(|c| c != account) {
            log::warn!("[hub] connection {} presented a token for someone else", conn.id);
            return Err(Error::Unauthorized);
        }
        if let Some(previous) = conn.account.filter(|&p| p != account) {
            self.table.lock().await.unbind(previous, conn.id);
        }
        conn.account = Some(account);
        let pending = {
            let mut table = self.table.lock().await;
            if table.bind(account, conn.id, conn.tx.clone()) {
                log::info!("[hub] {} replaced an older connection", account);
            }
            conn.send(&ServerMessage::Authenticated { account });
            table.disarm(account)
        };
        for id in pending {
            log::info!("[hub] {} reconnected to {} within grace", account, id);
            if let Err(e) = self.rejoin(account, id, since).await {
                log::warn!("[hub] could not restore {} to {}: {:?}", account, id, e);
            }
        }
        Ok(())
    }

    async fn rejoin(&self, account: ID<Account>, id: ID<Game>, since: Option<Ply>) -> Result<(), Error> {
        let game = self.registry.game(id).await?;
        let moves = self.registry.moves(id, since).await?;
        let mut table = self.table.lock().await;
        table.broadcast(id, &ServerMessage::OpponentReconnected);
        table.enter(account, id);
        table.send(account, &ServerMessage::Joined { game, moves });
        Ok(())
    }

    pub async fn join_room(&self, conn: &Connection, id: ID<Game>, since: Option<Ply>) -> Result<(), Error> {
        let account = conn.who()?;
        let game = self.registry.game(id).await?;
        if !game.is_participant(account) {
            return Err(Error::NotAParticipant);
        }
        let moves = self.registry.moves(id, since).await?;
        let mut table = self.table.lock().await;
        table.enter(account, id);
        table.send(account, &ServerMessage::Joined { game, moves });
        log::debug!("[hub] {} entered {}", account, id);
        Ok(())
    }

    pub async fn relay_move(&self, conn: &Connection, notation: &str) -> Result<(), Error> {
        let account = conn.who()?;
        let id = self.room(account).await?;
        let played = self.registry.record_move(id, account, notation).await?;
        let over = played.game.status().is_terminal().then(|| played.game.clone());
        let mut table = self.table.lock().await;
        table.broadcast(id, &ServerMessage::GameMove { data: played });
        if let Some(game) = over {
            table.settle(id);
            table.broadcast(id, &ServerMessage::GameOver { data: game });
        }
        Ok(())
    }

    pub async fn relay_chat(&self, conn: &Connection, text: &str) -> Result<(), Error> {
        let account = conn.who()?;
        let id = self.room(account).await?;
        let message = self.registry.post_chat(id, account, text).await?;
        self.table
            .lock()
            .await
            .broadcast(id, &ServerMessage::ChatMessage { data: message });
        Ok(())
    }

    /// Concedes the sender's current game.
    pub async fn resign(&self, conn: &Connection) -> Result<(), Error> {
        let account = conn.who()?;
        let id = self.room(account).await?;
        let game = self.registry.resign(id, account).await?;
        log::info!("[hub] {} resigned {}", account, id);
        self.announce(&game).await;
        Ok(())
    }

    /// Tells the room a game has ended outside the socket, e.g. by resignation.
    pub async fn announce(&self, game: &Game) {
        let mut table = self.table.lock().await;
        table.settle(game.id());
        table.broadcast(game.id(), &ServerMessage::GameOver { data: game.clone() });
    }

    /// Sends `message` to everyone in `game`'s room.
    pub async fn broadcast(&self, game: ID<Game>, message: &ServerMessage) {
        self.table.lock().await.broadcast(game, message);
    }

    /// Forgets `conn`. A player leaving an active game's room starts the
    /// grace timer; when it runs out the game is abandoned.
    pub async fn disconnect(self: &Arc<Self>, conn: &Connection) {
        let Some(account) = conn.account else {
            return;
        };
        let mut table = self.table.lock().await;
        let Some(room) = table.unbind(account, conn.id) else {
            log::debug!("[hub] superseded connection {} closed", conn.id);
            return;
        };
        log::info!("[hub] {} disconnected", account);
        let Some(id) = room else {
            return;
        };
        drop(table);
        match self.registry.game(id).await {
            Ok(game) if game.status() == Status::Active => self.countdown(account, id).await,
            _ => {}
        }
    }

    /// Starts grace timers for everyone in games that were in play before
    /// a restart. Nobody is connected yet, so each player has to come back.
    pub async fn resume(self: &Arc<Self>, games: &[Game]) {
        let active = games.iter().filter(|g| g.status() == Status::Active);
        let mut count = 0;
        for game in active {
            for account in std::iter::once(game.creator()).chain(game.opponent()) {
                self.countdown(account, game.id()).await;
            }
            count += 1;
        }
        log::info!("[hub] awaiting players for {} resumed games", count);
    }

    async fn countdown(self: &Arc<Self>, account: ID<Account>, id: ID<Game>) {
        let mut table = self.table.lock().await;
        if table.is_bound(account) {
            return;
        }
        let epoch = table.arm(account, id);
        table.broadcast(
            id,
            &ServerMessage::OpponentDisconnected {
                grace: self.grace.as_secs(),
            },
        );
        drop(table);
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hub.grace).await;
            hub.expire(account, id, epoch).await;
        });
    }

    async fn expire(&self, account: ID<Account>, id: ID<Game>, epoch: u64) {
        if !self.table.lock().await.expire(account, id, epoch) {
            return;
        }
        match self.registry.abandon(id, account).await {
            Ok(game) => {
                log::info!("[hub] {} abandoned {} after {:?}", account, id, self.grace);
                self.announce(&game).await;
            }
            Err(e) => log::debug!("[hub] grace for {} in {} lapsed quietly: {:?}", account, id, e),
        }
    }

    async fn room(&self, account: ID<Account>) -> Result<ID<Game>, Error> {
        self.table
            .lock()
            .await
            .room(account)
            .ok_or_else(|| Error::invalid("join a game first"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_ledger::*;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn sol(s: &str) -> Amount {
        s.parse().unwrap()
    }

    struct Stage {
        ledger: Ledger,
        registry: Arc<Registry>,
        authority: Arc<Authority>,
        hub: Arc<Hub>,
        idp: Shared,
    }

    struct Socket {
        conn: Connection,
        rx: UnboundedReceiver<String>,
    }

    impl Socket {
        /// Every frame received so far, parsed.
        fn drain(&mut self) -> Vec<serde_json::Value> {
            std::iter::from_fn(|| self.rx.try_recv().ok())
                .map(|s| serde_json::from_str(&s).unwrap())
                .collect()
        }
        fn types(&mut self) -> Vec<String> {
            self.drain()
                .into_iter()
                .map(|v| v["type"].as_str().unwrap().to_string())
                .collect()
        }
    }

    impl Stage {
        fn new() -> Self {
            let ledger = Ledger::new(Arc::new(MemoryVault::default()));
            let registry = Arc::new(Registry::new(
                ledger.clone(),
                Arc::new(MemoryGames::default()),
                Arc::new(Permissive),
            ));
            let authority = Arc::new(Authority::new(
                Crypto::new(b"jwt"),
                ledger.clone(),
                Arc::new(Shared::new(b"idp")),
                Arc::new(MemorySessions::default()),
            ));
            let hub = Arc::new(Hub::new(registry.clone(), authority.clone(), GRACE_PERIOD));
            Self {
                ledger,
                registry,
                authority,
                hub,
                idp: Shared::new(b"idp"),
            }
        }
        async fn player(&self, name: &str) -> (ID<Account>, String) {
            let (token, account) = self
                .authority
                .login(name, &self.idp.prove(name), name)
                .await
                .unwrap();
            self.ledger.credit(account.id(), sol("5")).await.unwrap();
            (account.id(), token)
        }
        fn socket(&self) -> Socket {
            let (tx, rx) = unbounded_channel();
            Socket {
                conn: self.hub.connect(tx),
                rx,
            }
        }
        async fn send(&self, socket: &mut Socket, json: String) {
            self.hub.handle(&mut socket.conn, &json).await;
        }
        async fn seated(&self, token: &str, game: ID<Game>) -> Socket {
            let mut socket = self.socket();
            self.send(&mut socket, format!(r#"{{"type":"auth","token":"{}"}}"#, token))
                .await;
            self.send(&mut socket, format!(r#"{{"type":"join_game","gameId":"{}"}}"#, game))
                .await;
            socket.drain();
            socket
        }
        /// Alice creates a 1 SOL game and Bob joins it, both seated in the room.
        async fn match_up(&self) -> (ID<Account>, ID<Account>, ID<Game>, Socket, Socket) {
            let (alice, a_token) = self.player("alice").await;
            let (bob, b_token) = self.player("bob").await;
            let game = self
                .registry
                .create(alice, sol("1"), TimeControl::default())
                .await
                .unwrap()
                .id();
            self.registry.join(game, bob).await.unwrap();
            let a = self.seated(&a_token, game).await;
            let b = self.seated(&b_token, game).await;
            (alice, bob, game, a, b)
        }
    }

    fn mv(notation: &str) -> String {
        format!(r#"{{"type":"game_move","move":"{}"}}"#, notation)
    }

    #[tokio::test]
    async fn everything_but_auth_needs_a_session() {
        let stage = Stage::new();
        let mut socket = stage.socket();
        assert_eq!(socket.types(), vec!["connected"]);
        stage.send(&mut socket, mv("e4")).await;
        let frames = socket.drain();
        assert_eq!(frames[0]["type"], "error");
        assert_eq!(frames[0]["code"], "unauthorized");
        stage.send(&mut socket, "not json".into()).await;
        assert_eq!(socket.drain()[0]["code"], "invalid_input");
    }

    #[tokio::test]
    async fn claimed_identity_must_match_the_token() {
        let stage = Stage::new();
        let (alice, token) = stage.player("alice").await;
        let (bob, _) = stage.player("bob").await;
        let mut socket = stage.socket();
        socket.drain();
        let spoof = format!(r#"{{"type":"auth","token":"{}","accountId":"{}"}}"#, token, bob);
        stage.send(&mut socket, spoof).await;
        assert_eq!(socket.drain()[0]["code"], "unauthorized");
        assert_eq!(socket.conn.account(), None);
        let honest = format!(r#"{{"type":"auth","token":"{}","accountId":"{}"}}"#, token, alice);
        stage.send(&mut socket, honest).await;
        assert_eq!(socket.types(), vec!["authenticated"]);
        assert_eq!(socket.conn.account(), Some(alice));
    }

    #[tokio::test]
    async fn outsiders_cannot_enter_a_room() {
        let stage = Stage::new();
        let (_, _, game, _a, _b) = stage.match_up().await;
        let (_, token) = stage.player("eve").await;
        let mut eve = stage.socket();
        stage
            .send(&mut eve, format!(r#"{{"type":"auth","token":"{}"}}"#, token))
            .await;
        stage
            .send(&mut eve, format!(r#"{{"type":"join_game","gameId":"{}"}}"#, game))
            .await;
        assert_eq!(eve.drain().last().unwrap()["code"], "not_a_participant");
    }

    #[tokio::test]
    async fn moves_and_chat_reach_both_players() {
        let stage = Stage::new();
        let (_, _, game, mut a, mut b) = stage.match_up().await;
        stage.send(&mut a, mv("e4")).await;
        let seen = b.drain();
        assert_eq!(seen[0]["type"], "game_move");
        assert_eq!(seen[0]["data"]["move"]["notation"], "e4");
        assert_eq!(a.types(), vec!["game_move"]);

        stage.send(&mut a, mv("d4")).await;
        assert_eq!(a.drain()[0]["code"], "out_of_turn");
        stage.send(&mut b, mv("e5")).await;
        a.drain();
        b.drain();

        let chat = r#"{"type":"chat_message","content":"good luck"}"#.to_string();
        stage.send(&mut b, chat).await;
        assert_eq!(a.drain()[0]["data"]["text"], "good luck");
        assert_eq!(b.types(), vec!["chat_message"]);
        assert_eq!(stage.registry.moves(game, None).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnecting_within_grace_restores_the_room() {
        let stage = Stage::new();
        let (alice, _, game, mut a, mut b) = stage.match_up().await;
        stage.send(&mut a, mv("e4")).await;
        stage.send(&mut b, mv("e5")).await;
        a.drain();
        b.drain();

        stage.hub.disconnect(&a.conn).await;
        assert_eq!(b.types(), vec!["opponent_disconnected"]);
        tokio::time::sleep(GRACE_PERIOD / 2).await;

        let (token, _) = stage
            .authority
            .login("alice", &stage.idp.prove("alice"), "")
            .await
            .unwrap();
        let mut back = stage.socket();
        back.drain();
        stage
            .send(&mut back, format!(r#"{{"type":"auth","token":"{}","since":0}}"#, token))
            .await;
        let frames = back.drain();
        assert_eq!(frames[0]["type"], "authenticated");
        assert_eq!(frames[1]["type"], "joined");
        let replay = frames[1]["moves"].as_array().unwrap();
        assert_eq!(replay.len(), 1);
        assert_eq!(replay[0]["notation"], "e5");
        assert_eq!(b.types(), vec!["opponent_reconnected"]);

        stage.send(&mut back, mv("Nf3")).await;
        let seen = b.drain();
        assert_eq!(seen[0]["type"], "game_move");
        assert_eq!(seen[0]["data"]["move"]["notation"], "Nf3");
        assert_eq!(back.types(), vec!["game_move"]);

        tokio::time::sleep(GRACE_PERIOD * 2).await;
        let game = stage.registry.game(game).await.unwrap();
        assert_eq!((game.status(), game.ply()), (Status::Active, 3));
        assert_eq!(stage.ledger.balance(alice).await.unwrap(), sol("4"));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_expiry_cancels_and_refunds() {
        let stage = Stage::new();
        let (alice, bob, game, a, mut b) = stage.match_up().await;
        stage.hub.disconnect(&a.conn).await;
        tokio::time::sleep(GRACE_PERIOD + Duration::from_secs(1)).await;
        let game = stage.registry.game(game).await.unwrap();
        assert_eq!(game.status(), Status::Cancelled);
        assert_eq!(stage.ledger.balance(alice).await.unwrap(), sol("5"));
        assert_eq!(stage.ledger.balance(bob).await.unwrap(), sol("5"));
        assert_eq!(b.types(), vec!["opponent_disconnected", "game_over"]);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_a_replaced_connection_changes_nothing() {
        let stage = Stage::new();
        let (_, _, game, a, mut b) = stage.match_up().await;
        let (token, _) = stage
            .authority
            .login("alice", &stage.idp.prove("alice"), "")
            .await
            .unwrap();
        let _fresh = stage.seated(&token, game).await;
        stage.hub.disconnect(&a.conn).await;
        tokio::time::sleep(GRACE_PERIOD * 2).await;
        assert_eq!(stage.registry.game(game).await.unwrap().status(), Status::Active);
        assert!(b.types().is_empty());
    }

    #[tokio::test]
    async fn resigning_over_the_socket_pays_the_opponent() {
        let stage = Stage::new();
        let (alice, bob, game, mut a, mut b) = stage.match_up().await;
        stage.send(&mut a, r#"{"type":"resign"}"#.to_string()).await;
        let over = b.drain();
        assert_eq!(over[0]["type"], "game_over");
        assert_eq!(over[0]["data"]["winner"], bob.to_string());
        assert_eq!(a.types(), vec!["game_over"]);
        assert_eq!(stage.registry.game(game).await.unwrap().status(), Status::Completed);
        assert_eq!(stage.ledger.balance(alice).await.unwrap(), sol("4"));
        assert_eq!(stage.ledger.balance(bob).await.unwrap(), sol("6"));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_outside_a_room_starts_no_timer() {
        let stage = Stage::new();
        let (alice, bob, game, _, mut b) = stage.match_up().await;
        let (token, _) = stage
            .authority
            .login("alice", &stage.idp.prove("alice"), "")
            .await
            .unwrap();
        let mut lobby = stage.socket();
        stage
            .send(&mut lobby, format!(r#"{{"type":"auth","token":"{}"}}"#, token))
            .await;
        stage.hub.disconnect(&lobby.conn).await;
        tokio::time::sleep(GRACE_PERIOD * 2).await;
        assert_eq!(stage.registry.game(game).await.unwrap().status(), Status::Active);
        assert!(b.types().is_empty());
        assert_eq!(stage.ledger.balance(alice).await.unwrap(), sol("4"));
        assert_eq!(stage.ledger.balance(bob).await.unwrap(), sol("4"));
    }

    #[tokio::test(start_paused = true)]
    async fn resumed_games_wait_for_both_players() {
        let stage = Stage::new();
        let (alice, a_token) = stage.player("alice").await;
        let (bob, _) = stage.player("bob").await;
        let game = stage
            .registry
            .create(alice, sol("1"), TimeControl::default())
            .await
            .unwrap()
            .id();
        stage.registry.join(game, bob).await.unwrap();
        stage.hub.resume(&stage.registry.active().await).await;

        let mut a = stage.socket();
        a.drain();
        stage
            .send(&mut a, format!(r#"{{"type":"auth","token":"{}"}}"#, a_token))
            .await;
        assert_eq!(a.types(), vec!["authenticated", "joined"]);

        tokio::time::sleep(GRACE_PERIOD + Duration::from_secs(1)).await;
        assert_eq!(stage.registry.game(game).await.unwrap().status(), Status::Cancelled);
        assert_eq!(a.types(), vec!["game_over"]);
        assert_eq!(stage.ledger.balance(alice).await.unwrap(), sol("5"));
        assert_eq!(stage.ledger.balance(bob).await.unwrap(), sol("5"));
    }
}
