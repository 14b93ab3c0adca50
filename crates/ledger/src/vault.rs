use super::*;
use sm_core::*;

/// Versioned account storage.
///
/// Writes are conditional on the version the caller read: [`Vault::swap`]
/// stores `next` only if the stored version equals `next.version() - 1`.
/// Implementations never mutate balances on their own.
#[async_trait::async_trait]
pub trait Vault: Send + Sync {
    async fn fetch(&self, id: ID<Account>) -> Result<Option<Account>, Error>;
    async fn lookup(&self, external: &str) -> Result<Option<Account>, Error>;
    /// Stores a new account unless one already holds its external identity.
    /// Returns whichever account owns that identity afterwards.
    async fn insert(&self, account: &Account) -> Result<Account, Error>;
    async fn swap(&self, next: &Account) -> Result<bool, Error>;
    /// Active accounts by rating, then wins.
    async fn leaders(&self, limit: i64) -> Result<Vec<Account>, Error>;
    /// Active accounts by net earnings, then wins.
    async fn leaders_by_earnings(&self, limit: i64) -> Result<Vec<Account>, Error>;
    /// Number of active accounts.
    async fn population(&self) -> Result<i64, Error>;
}
