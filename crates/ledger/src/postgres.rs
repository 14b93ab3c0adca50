use super::*;
use sm_core::*;
use sm_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

#[rustfmt::skip]
const COLUMNS: &str = "id, external, name, rating, balance, games, wins, earnings, active, version, created";

#[async_trait::async_trait]
impl Vault for Arc<Client> {
    async fn fetch(&self, id: ID<Account>) -> Result<Option<Account>, Error> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", ACCOUNTS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await
        .map(|opt| opt.as_ref().map(Account::from))
        .map_err(Error::from)
    }
    async fn lookup(&self, external: &str) -> Result<Option<Account>, Error> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", ACCOUNTS, " WHERE external = $1"),
            &[&external],
        )
        .await
        .map(|opt| opt.as_ref().map(Account::from))
        .map_err(Error::from)
    }
    async fn insert(&self, account: &Account) -> Result<Account, Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                ACCOUNTS,
                " (",
                COLUMNS,
                ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                " ON CONFLICT (external) DO NOTHING"
            ),
            &[
                &account.id().inner(),
                &account.external(),
                &account.name(),
                &account.rating(),
                &account.balance().inner(),
                &account.games(),
                &account.wins(),
                &account.earnings().inner(),
                &account.active(),
                &account.version(),
                &account.created(),
            ],
        )
        .await?;
        self.lookup(account.external())
            .await?
            .ok_or(Error::NotFound)
    }
    async fn swap(&self, next: &Account) -> Result<bool, Error> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                ACCOUNTS,
                " SET name = $3, rating = $4, balance = $5, games = $6, wins = $7,",
                " earnings = $8, active = $9, version = $10",
                " WHERE id = $1 AND version = $2"
            ),
            &[
                &next.id().inner(),
                &(next.version() - 1),
                &next.name(),
                &next.rating(),
                &next.balance().inner(),
                &next.games(),
                &next.wins(),
                &next.earnings().inner(),
                &next.active(),
                &next.version(),
            ],
        )
        .await
        .map(|n| n == 1)
        .map_err(Error::from)
    }
    async fn leaders(&self, limit: i64) -> Result<Vec<Account>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " FROM ",
                ACCOUNTS,
                " WHERE active ORDER BY rating DESC, wins DESC LIMIT $1"
            ),
            &[&limit],
        )
        .await
        .map(|rows| rows.iter().map(Account::from).collect())
        .map_err(Error::from)
    }
    async fn leaders_by_earnings(&self, limit: i64) -> Result<Vec<Account>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " FROM ",
                ACCOUNTS,
                " WHERE active ORDER BY earnings DESC, wins DESC LIMIT $1"
            ),
            &[&limit],
        )
        .await
        .map(|rows| rows.iter().map(Account::from).collect())
        .map_err(Error::from)
    }
    async fn population(&self) -> Result<i64, Error> {
        self.query_one(
            const_format::concatcp!("SELECT COUNT(*) FROM ", ACCOUNTS, " WHERE active"),
            &[],
        )
        .await
        .map(|row| row.get::<_, i64>(0))
        .map_err(Error::from)
    }
}
