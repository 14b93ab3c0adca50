use super::*;
use sm_core::*;
use sm_ledger::Account;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process [`TransferRepository`].
#[derive(Default)]
pub struct MemoryTransfers {
    transfers: RwLock<HashMap<ID<Transfer>, Transfer>>,
}

#[async_trait::async_trait]
impl TransferRepository for MemoryTransfers {
    async fn create(&self, transfer: &Transfer) -> Result<(), Error> {
        self.transfers
            .write()
            .await
            .insert(transfer.id(), transfer.clone());
        Ok(())
    }
    async fn fetch(&self, id: ID<Transfer>) -> Result<Option<Transfer>, Error> {
        Ok(self.transfers.read().await.get(&id).cloned())
    }
    async fn resolve(&self, transfer: &Transfer) -> Result<bool, Error> {
        let mut transfers = self.transfers.write().await;
        match transfers.get_mut(&transfer.id()) {
            Some(stored) if stored.status() == TransferStatus::Pending => {
                *stored = transfer.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::NotFound),
        }
    }
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Transfer>, Error> {
        let mut mine = self
            .transfers
            .read()
            .await
            .values()
            .filter(|t| t.account() == account)
            .cloned()
            .collect::<Vec<_>>();
        mine.sort_by_key(|t| std::cmp::Reverse(t.created()));
        mine.truncate(limit.max(0) as usize);
        Ok(mine)
    }
}
