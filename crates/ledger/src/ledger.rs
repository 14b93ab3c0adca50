use super::*;
use sm_core::*;
use std::sync::Arc;

/// The single authority for balance mutation.
///
/// Every write reads the current snapshot, derives the next one, and
/// compare-and-swaps it into the [`Vault`]. A lost race is retried up to
/// [`LEDGER_ATTEMPTS`] times before surfacing as
/// [`Error::LedgerContention`]. Domain failures such as
/// [`Error::InsufficientFunds`] are returned on the first attempt.
#[derive(Clone)]
pub struct Ledger {
    vault: Arc<dyn Vault>,
}

impl Ledger {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self { vault }
    }

    /// Applies `f` to the latest snapshot of `id` until the swap lands.
    pub async fn update<F>(&self, id: ID<Account>, f: F) -> Result<Account, Error>
    where
        F: Fn(&Account) -> Result<Account, Error> + Send + Sync,
    {
        for attempt in 1..=LEDGER_ATTEMPTS {
            let prev = self.vault.fetch(id).await?.ok_or(Error::NotFound)?;
            let next = f(&prev)?;
            if self.vault.swap(&next).await? {
                return Ok(next);
            }
            log::debug!("[ledger] version conflict on {} (attempt {})", id, attempt);
            tokio::task::yield_now().await;
        }
        log::warn!("[ledger] contention on {} after {} attempts", id, LEDGER_ATTEMPTS);
        Err(Error::LedgerContention)
    }

    pub async fn credit(&self, id: ID<Account>, amount: Amount) -> Result<Account, Error> {
        self.update(id, |a| a.credited(amount)).await
    }
    pub async fn debit(&self, id: ID<Account>, amount: Amount) -> Result<Account, Error> {
        self.update(id, |a| a.debited(amount)).await
    }
    /// Pays out winnings; `profit` is the part not staked by the winner.
    /// Failures are logged for reconciliation like [`Ledger::refund`].
    pub async fn award(&self, id: ID<Account>, amount: Amount, profit: Amount) -> Result<Account, Error> {
        self.update(id, |a| a.awarded(amount, profit))
            .await
            .inspect_err(|e| {
                log::error!("[ledger] RECONCILE payout of {} SOL to {} failed: {:?}", amount, id, e)
            })
    }

    /// Returns escrowed or debited funds to their payer.
    /// A failure here means money is unaccounted for, so it is logged for
    /// manual reconciliation before being returned.
    pub async fn refund(&self, id: ID<Account>, amount: Amount, context: &str) -> Result<Account, Error> {
        self.credit(id, amount).await.inspect_err(|e| {
            log::error!(
                "[ledger] RECONCILE refund of {} SOL to {} failed ({}): {:?}",
                amount,
                id,
                context,
                e
            )
        })
    }

    /// Moves `amount` between two accounts. If the credit leg fails the
    /// debit is compensated before the original error is returned.
    pub async fn transfer(&self, from: ID<Account>, to: ID<Account>, amount: Amount) -> Result<(), Error> {
        if from == to {
            return Err(Error::invalid("cannot transfer to the same account"));
        }
        self.debit(from, amount).await?;
        match self.credit(to, amount).await {
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!("[ledger] transfer {} -> {} failed on credit: {:?}", from, to, e);
                let _ = self.refund(from, amount, "transfer compensation").await;
                Err(e)
            }
        }
    }

    /// Returns the account for an external identity, creating it on first sight.
    pub async fn open(&self, external: &str, name: &str) -> Result<Account, Error> {
        if external.trim().is_empty() {
            return Err(Error::invalid("external identity is required"));
        }
        if let Some(account) = self.vault.lookup(external).await? {
            return Ok(account);
        }
        let name = match name.trim() {
            "" => external.chars().take(8).collect::<String>(),
            name => name.chars().take(32).collect::<String>(),
        };
        let account = self.vault.insert(&Account::new(external.to_string(), name)).await?;
        log::info!("[ledger] opened account {} for {}", account.id(), external);
        Ok(account)
    }
    pub async fn account(&self, id: ID<Account>) -> Result<Account, Error> {
        self.vault.fetch(id).await?.ok_or(Error::NotFound)
    }
    pub async fn balance(&self, id: ID<Account>) -> Result<Amount, Error> {
        self.account(id).await.map(|a| a.balance())
    }
    pub async fn seed(&self, id: ID<Account>, rating: Rating) -> Result<Account, Error> {
        self.update(id, |a| a.seeded(rating)).await
    }
    pub async fn rename(&self, id: ID<Account>, name: &str) -> Result<Account, Error> {
        self.update(id, |a| a.renamed(name.to_string())).await
    }
    pub async fn deactivate(&self, id: ID<Account>) -> Result<Account, Error> {
        self.update(id, |a| Ok(a.deactivated())).await
    }
    pub async fn leaders(&self, limit: i64) -> Result<Vec<Account>, Error> {
        self.vault.leaders(limit).await
    }
    pub async fn earners(&self, limit: i64) -> Result<Vec<Account>, Error> {
        self.vault.leaders_by_earnings(limit).await
    }
    pub async fn population(&self) -> Result<i64, Error> {
        self.vault.population().await
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
    async fn funded(ledger: &Ledger, external: &str, amount: &str) -> ID<Account> {
        let id = ledger.open(external, external).await.unwrap().id();
        ledger.credit(id, sol(amount)).await.unwrap();
        id
    }

    /// Vault that loses every race, or fails every write to one account.
    struct Hostile {
        inner: MemoryVault,
        conflicts: bool,
        broken: Option<ID<Account>>,
        swaps: AtomicUsize,
    }
    #[async_trait::async_trait]
    impl Vault for Hostile {
        async fn fetch(&self, id: ID<Account>) -> Result<Option<Account>, Error> {
            self.inner.fetch(id).await
        }
        async fn lookup(&self, external: &str) -> Result<Option<Account>, Error> {
            self.inner.lookup(external).await
        }
        async fn insert(&self, account: &Account) -> Result<Account, Error> {
            self.inner.insert(account).await
        }
        async fn swap(&self, next: &Account) -> Result<bool, Error> {
            self.swaps.fetch_add(1, Ordering::SeqCst);
            if self.conflicts {
                return Ok(false);
            }
            if self.broken == Some(next.id()) {
                return Err(Error::Storage("disk on fire".into()));
            }
            self.inner.swap(next).await
        }
        async fn leaders(&self, limit: i64) -> Result<Vec<Account>, Error> {
            self.inner.leaders(limit).await
        }
        async fn leaders_by_earnings(&self, limit: i64) -> Result<Vec<Account>, Error> {
            self.inner.leaders_by_earnings(limit).await
        }
        async fn population(&self) -> Result<i64, Error> {
            self.inner.population().await
        }
    }
    fn hostile() -> Hostile {
        Hostile {
            inner: MemoryVault::default(),
            conflicts: false,
            broken: None,
            swaps: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn open_is_idempotent_per_identity() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let a = ledger.open("wallet-a", "alice").await.unwrap();
        let b = ledger.open("wallet-a", "someone else").await.unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(b.name(), "alice");
    }

    #[tokio::test]
    async fn debit_beyond_balance_is_rejected_without_retry() {
        let vault = Arc::new(hostile());
        let ledger = Ledger::new(vault.clone());
        let id = ledger.open("a", "alice").await.unwrap().id();
        ledger.credit(id, sol("0.5")).await.unwrap();
        let before = vault.swaps.load(Ordering::SeqCst);
        assert_eq!(ledger.debit(id, sol("1")).await, Err(Error::InsufficientFunds));
        assert_eq!(vault.swaps.load(Ordering::SeqCst), before);
        assert_eq!(ledger.balance(id).await.unwrap(), sol("0.5"));
    }

    #[tokio::test]
    async fn persistent_conflicts_surface_as_contention() {
        let vault = Arc::new(Hostile {
            conflicts: true,
            ..hostile()
        });
        let ledger = Ledger::new(vault.clone());
        let id = ledger.open("a", "alice").await.unwrap().id();
        assert_eq!(ledger.credit(id, sol("1")).await, Err(Error::LedgerContention));
        assert_eq!(vault.swaps.load(Ordering::SeqCst), LEDGER_ATTEMPTS);
    }

    #[tokio::test]
    async fn transfer_moves_funds() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let a = funded(&ledger, "a", "2").await;
        let b = funded(&ledger, "b", "1").await;
        ledger.transfer(a, b, sol("0.75")).await.unwrap();
        assert_eq!(ledger.balance(a).await.unwrap(), sol("1.25"));
        assert_eq!(ledger.balance(b).await.unwrap(), sol("1.75"));
        assert_eq!(ledger.transfer(a, b, sol("5")).await, Err(Error::InsufficientFunds));
    }

    #[tokio::test]
    async fn failed_credit_leg_is_compensated() {
        let a = Account::new("a".into(), "alice".into());
        let b = Account::new("b".into(), "bob".into());
        let vault = Hostile {
            broken: Some(b.id()),
            ..hostile()
        };
        vault.inner.insert(&a).await.unwrap();
        vault.inner.insert(&b).await.unwrap();
        let ledger = Ledger::new(Arc::new(vault));
        ledger.credit(a.id(), sol("2")).await.unwrap();
        assert!(matches!(ledger.transfer(a.id(), b.id(), sol("1")).await, Err(Error::Storage(_))));
        assert_eq!(ledger.balance(a.id()).await.unwrap(), sol("2"));
        assert_eq!(ledger.balance(b.id()).await.unwrap(), Amount::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_never_lose_updates() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let id = funded(&ledger, "a", "1").await;
        let tasks = (0..64)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    match i % 2 {
                        0 => ledger.credit(id, sol("0.1")).await.map(|_| 1),
                        _ => ledger.debit(id, sol("0.1")).await.map(|_| -1),
                    }
                })
            })
            .collect::<Vec<_>>();
        let mut net = 0i64;
        for task in futures::future::join_all(tasks).await {
            match task.unwrap() {
                Ok(sign) => net += sign,
                Err(e) => assert!(matches!(e, Error::LedgerContention | Error::InsufficientFunds)),
            }
        }
        let balance = ledger.balance(id).await.unwrap();
        assert!(!balance.is_negative());
        assert_eq!(balance, Amount::lamports(LAMPORTS_PER_SOL + net * 100_000_000));
    }

    #[tokio::test]
    async fn seed_only_before_first_game() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let id = ledger.open("a", "alice").await.unwrap().id();
        assert_eq!(ledger.seed(id, 1700).await.unwrap().rating(), 1700);
        ledger.update(id, |a| Ok(a.rated(-16, false))).await.unwrap();
        assert!(matches!(ledger.seed(id, 2000).await, Err(Error::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn leaders_rank_active_accounts_by_rating() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let a = ledger.open("a", "alice").await.unwrap().id();
        let b = ledger.open("b", "bob").await.unwrap().id();
        let c = ledger.open("c", "carol").await.unwrap().id();
        ledger.seed(a, 1500).await.unwrap();
        ledger.seed(b, 1900).await.unwrap();
        ledger.seed(c, 2100).await.unwrap();
        ledger.deactivate(c).await.unwrap();
        let leaders = ledger.leaders(10).await.unwrap();
        assert_eq!(leaders.iter().map(|a| a.id()).collect::<Vec<_>>(), vec![b, a]);
    }

    #[tokio::test]
    async fn earners_rank_by_net_winnings() {
        let ledger = Ledger::new(Arc::new(MemoryVault::default()));
        let a = funded(&ledger, "a", "5").await;
        let b = funded(&ledger, "b", "5").await;
        let c = funded(&ledger, "c", "5").await;
        ledger.award(a, sol("2"), sol("1")).await.unwrap();
        ledger.award(b, sol("6"), sol("3")).await.unwrap();
        ledger.deactivate(c).await.unwrap();
        let earners = ledger.earners(10).await.unwrap();
        assert_eq!(earners.iter().map(|a| a.id()).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(earners[0].earnings(), sol("3"));
        assert_eq!(ledger.earners(1).await.unwrap().len(), 1);
        assert_eq!(ledger.population().await.unwrap(), 2);
    }
}
