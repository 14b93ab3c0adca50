use super::*;
use sm_core::*;
use sm_ledger::Account;

/// Durable storage for deposits and withdrawals.
#[async_trait::async_trait]
pub trait TransferRepository: Send + Sync {
    async fn create(&self, transfer: &Transfer) -> Result<(), Error>;
    async fn fetch(&self, id: ID<Transfer>) -> Result<Option<Transfer>, Error>;
    /// Stores a terminal `transfer` only if the stored one is still pending.
    /// Returns whether it was stored.
    async fn resolve(&self, transfer: &Transfer) -> Result<bool, Error>;
    /// Newest first.
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Transfer>, Error>;
}
