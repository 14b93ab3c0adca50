use sm_auth::*;
use sm_core::*;
use sm_gameroom::*;
use sm_hosting::*;
use sm_ledger::*;
use sm_tournament::*;
use sm_wallet::*;
use std::sync::Arc;
use tokio_postgres::Client;

/// One storage backend per concern.
pub struct Stores {
    pub vault: Arc<dyn Vault>,
    pub games: Arc<dyn GameRepository>,
    pub tournaments: Arc<dyn TournamentRepository>,
    pub transfers: Arc<dyn TransferRepository>,
    pub sessions: Arc<dyn AuthRepository>,
    pub client: Option<Arc<Client>>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            vault: Arc::new(MemoryVault::default()),
            games: Arc::new(MemoryGames::default()),
            tournaments: Arc::new(MemoryTournaments::default()),
            transfers: Arc::new(MemoryTransfers::default()),
            sessions: Arc::new(MemorySessions::default()),
            client: None,
        }
    }
    pub fn postgres(client: Arc<Client>) -> Self {
        Self {
            vault: Arc::new(client.clone()),
            games: Arc::new(client.clone()),
            tournaments: Arc::new(client.clone()),
            transfers: Arc::new(client.clone()),
            sessions: Arc::new(client.clone()),
            client: Some(client),
        }
    }
    /// Creates every table in dependency order.
    pub async fn migrate(client: &Client) -> Result<(), sm_pg::PgErr> {
        sm_pg::migrate::<Account>(client).await?;
        sm_pg::migrate::<Session>(client).await?;
        sm_pg::migrate::<Game>(client).await?;
        sm_pg::migrate::<Move>(client).await?;
        sm_pg::migrate::<ChatMessage>(client).await?;
        sm_pg::migrate::<Tournament>(client).await?;
        sm_pg::migrate::<Entrant>(client).await?;
        sm_pg::migrate::<Pairing>(client).await?;
        sm_pg::migrate::<Transfer>(client).await?;
        Ok(())
    }
}

/// Every service the HTTP and WebSocket handlers reach for.
#[derive(Clone)]
pub struct Services {
    pub ledger: Ledger,
    pub registry: Arc<Registry>,
    pub tournaments: Arc<Tournaments>,
    pub cashier: Cashier,
    pub authority: Arc<Authority>,
    pub hub: Arc<Hub>,
    pub database: Option<Arc<Client>>,
}

impl Services {
    /// Wires the services together and reloads live games.
    /// Tournaments subscribe to game results before anything can finish,
    /// and reloaded games in play start their players' grace timers.
    pub async fn build(
        stores: Stores,
        crypto: Crypto,
        provider: Arc<dyn Provider>,
        payments: Arc<dyn Payments>,
        rules: Arc<dyn Rules>,
    ) -> Result<Self, Error> {
        let ledger = Ledger::new(stores.vault);
        let registry = Arc::new(Registry::new(ledger.clone(), stores.games, rules));
        let tournaments = Arc::new(Tournaments::new(
            ledger.clone(),
            registry.clone(),
            stores.tournaments,
        ));
        tournaments.attach().await;
        registry.hydrate().await?;
        let cashier = Cashier::new(ledger.clone(), stores.transfers, payments);
        let authority = Arc::new(Authority::new(crypto, ledger.clone(), provider, stores.sessions));
        let hub = Arc::new(Hub::new(registry.clone(), authority.clone(), GRACE_PERIOD));
        hub.resume(&registry.active().await).await;
        Ok(Self {
            ledger,
            registry,
            tournaments,
            cashier,
            authority,
            hub,
            database: stores.client,
        })
    }

    /// Registers every service as actix app data.
    pub fn register(&self, cfg: &mut actix_web::web::ServiceConfig) {
        use actix_web::web::Data;
        cfg.app_data(Data::new(self.ledger.clone()))
            .app_data(Data::from(self.registry.clone()))
            .app_data(Data::from(self.tournaments.clone()))
            .app_data(Data::new(self.cashier.clone()))
            .app_data(Data::from(self.authority.clone()))
            .app_data(Data::from(self.hub.clone()))
            .app_data(Data::new(self.clone()));
    }
}
