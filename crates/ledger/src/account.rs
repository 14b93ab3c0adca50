use sm_core::*;
use std::time::SystemTime;

/// A player's custodial account.
///
/// Snapshots are immutable: every mutation produces the next snapshot with
/// its version bumped by one, which the [`Vault`](crate::Vault) only accepts
/// if the stored version is still the one it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: ID<Self>,
    external: String,
    name: String,
    rating: Rating,
    balance: Amount,
    games: i32,
    wins: i32,
    earnings: Amount,
    active: bool,
    version: i64,
    created: SystemTime,
}

impl Account {
    pub fn new(external: String, name: String) -> Self {
        Self {
            id: ID::default(),
            external,
            name,
            rating: DEFAULT_RATING,
            balance: Amount::ZERO,
            games: 0,
            wins: 0,
            earnings: Amount::ZERO,
            active: true,
            version: 0,
            created: SystemTime::now(),
        }
    }
    pub fn external(&self) -> &str {
        &self.external
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn rating(&self) -> Rating {
        self.rating
    }
    pub fn balance(&self) -> Amount {
        self.balance
    }
    pub fn games(&self) -> i32 {
        self.games
    }
    pub fn wins(&self) -> i32 {
        self.wins
    }
    pub fn earnings(&self) -> Amount {
        self.earnings
    }
    pub fn active(&self) -> bool {
        self.active
    }
    pub fn version(&self) -> i64 {
        self.version
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    /// Whole-percent share of games won.
    pub fn win_rate(&self) -> i32 {
        match self.games {
            0 => 0,
            n => ((self.wins as f64 / n as f64) * 100.0).round() as i32,
        }
    }
}

impl Account {
    fn next(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }
    pub fn credited(&self, amount: Amount) -> Result<Self, Error> {
        if !amount.is_positive() {
            return Err(Error::invalid("credit must be positive"));
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::invalid("balance overflow"))?;
        Ok(Self {
            balance,
            ..self.next()
        })
    }
    pub fn debited(&self, amount: Amount) -> Result<Self, Error> {
        if !amount.is_positive() {
            return Err(Error::invalid("debit must be positive"));
        }
        if !self.active {
            return Err(Error::Unauthorized);
        }
        match self.balance.checked_sub(amount) {
            Some(balance) if !balance.is_negative() => Ok(Self {
                balance,
                ..self.next()
            }),
            _ => Err(Error::InsufficientFunds),
        }
    }
    /// Credits a payout of which `profit` counts toward lifetime earnings.
    pub fn awarded(&self, amount: Amount, profit: Amount) -> Result<Self, Error> {
        let credited = self.credited(amount)?;
        Ok(Self {
            earnings: credited
                .earnings
                .checked_add(profit)
                .ok_or_else(|| Error::invalid("earnings overflow"))?,
            ..credited
        })
    }
    /// Applies a rating delta and records one more finished game.
    pub fn rated(&self, delta: Rating, won: bool) -> Self {
        Self {
            rating: self.rating + delta,
            games: self.games + 1,
            wins: self.wins + won as i32,
            ..self.next()
        }
    }
    /// Sets the starting rating from an external lookup.
    /// Only accounts that have not finished a game may be seeded.
    pub fn seeded(&self, rating: Rating) -> Result<Self, Error> {
        if self.games > 0 {
            return Err(Error::transition("rating can only be seeded before the first game"));
        }
        if !(100..=3500).contains(&rating) {
            return Err(Error::invalid("rating must lie between 100 and 3500"));
        }
        Ok(Self {
            rating,
            ..self.next()
        })
    }
    pub fn renamed(&self, name: String) -> Result<Self, Error> {
        let name = name.trim().to_string();
        if name.len() < 3 || name.len() > 32 {
            return Err(Error::invalid("name must be 3-32 characters"));
        }
        Ok(Self { name, ..self.next() })
    }
    pub fn deactivated(&self) -> Self {
        Self {
            active: false,
            ..self.next()
        }
    }
}

impl Unique for Account {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Account {
        fn name() -> &'static str {
            ACCOUNTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                ACCOUNTS,
                " (
                    id          UUID PRIMARY KEY,
                    external    TEXT NOT NULL UNIQUE,
                    name        VARCHAR(32) NOT NULL,
                    rating      INTEGER NOT NULL DEFAULT 1200,
                    balance     BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
                    games       INTEGER NOT NULL DEFAULT 0,
                    wins        INTEGER NOT NULL DEFAULT 0,
                    earnings    BIGINT NOT NULL DEFAULT 0,
                    active      BOOLEAN NOT NULL DEFAULT TRUE,
                    version     BIGINT NOT NULL DEFAULT 0,
                    created     TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_accounts_rating ON ",
                ACCOUNTS,
                " (rating DESC) WHERE active;"
            )
        }
    }
}

#[cfg(feature = "database")]
impl From<&tokio_postgres::Row> for Account {
    fn from(row: &tokio_postgres::Row) -> Self {
        Self {
            id: ID::from(row.get::<_, uuid::Uuid>(0)),
            external: row.get::<_, String>(1),
            name: row.get::<_, String>(2),
            rating: row.get::<_, Rating>(3),
            balance: Amount::lamports(row.get::<_, i64>(4)),
            games: row.get::<_, i32>(5),
            wins: row.get::<_, i32>(6),
            earnings: Amount::lamports(row.get::<_, i64>(7)),
            active: row.get::<_, bool>(8),
            version: row.get::<_, i64>(9),
            created: row.get::<_, SystemTime>(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn funded(sol: &str) -> Account {
        Account::new("ext".into(), "alice".into())
            .credited(sol.parse().unwrap())
            .unwrap()
    }
    #[test]
    fn new_account_defaults() {
        let a = Account::new("ext".into(), "alice".into());
        assert_eq!(a.rating(), DEFAULT_RATING);
        assert_eq!(a.balance(), Amount::ZERO);
        assert_eq!(a.version(), 0);
        assert!(a.active());
    }
    #[test]
    fn debit_cannot_go_negative() {
        let a = funded("0.5");
        assert_eq!(a.debited("0.6".parse().unwrap()), Err(Error::InsufficientFunds));
        let b = a.debited("0.5".parse().unwrap()).unwrap();
        assert_eq!(b.balance(), Amount::ZERO);
        assert_eq!(b.version(), a.version() + 1);
    }
    #[test]
    fn non_positive_amounts_rejected() {
        let a = funded("1");
        assert!(a.credited(Amount::ZERO).is_err());
        assert!(a.debited(Amount::lamports(-1)).is_err());
    }
    #[test]
    fn award_counts_earnings() {
        let a = funded("1")
            .awarded("0.6".parse().unwrap(), "0.3".parse().unwrap())
            .unwrap();
        assert_eq!(a.balance(), "1.6".parse().unwrap());
        assert_eq!(a.earnings(), "0.3".parse().unwrap());
    }
    #[test]
    fn seeding_closes_after_first_game() {
        let a = funded("1");
        assert_eq!(a.seeded(1850).unwrap().rating(), 1850);
        let played = a.rated(20, true);
        assert!(played.seeded(1850).is_err());
        assert_eq!(played.win_rate(), 100);
    }
    #[test]
    fn inactive_accounts_cannot_spend_but_receive() {
        let a = funded("1").deactivated();
        assert_eq!(a.debited("0.1".parse().unwrap()), Err(Error::Unauthorized));
        assert!(a.credited("0.1".parse().unwrap()).is_ok());
    }
}
