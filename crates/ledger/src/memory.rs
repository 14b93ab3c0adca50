use super::*;
use sm_core::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process [`Vault`] keyed by account id.
#[derive(Default)]
pub struct MemoryVault {
    accounts: RwLock<HashMap<ID<Account>, Account>>,
}

#[async_trait::async_trait]
impl Vault for MemoryVault {
    async fn fetch(&self, id: ID<Account>) -> Result<Option<Account>, Error> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }
    async fn lookup(&self, external: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.external() == external)
            .cloned())
    }
    async fn insert(&self, account: &Account) -> Result<Account, Error> {
        let mut accounts = self.accounts.write().await;
        match accounts.values().find(|a| a.external() == account.external()) {
            Some(existing) => Ok(existing.clone()),
            None => {
                accounts.insert(account.id(), account.clone());
                Ok(account.clone())
            }
        }
    }
    async fn swap(&self, next: &Account) -> Result<bool, Error> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&next.id()) {
            Some(prev) if prev.version() + 1 == next.version() => {
                *prev = next.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::NotFound),
        }
    }
    async fn leaders(&self, limit: i64) -> Result<Vec<Account>, Error> {
        Ok(self
            .ranked(limit, |a, b| {
                b.rating()
                    .cmp(&a.rating())
                    .then_with(|| b.wins().cmp(&a.wins()))
            })
            .await)
    }
    async fn leaders_by_earnings(&self, limit: i64) -> Result<Vec<Account>, Error> {
        Ok(self
            .ranked(limit, |a, b| {
                b.earnings()
                    .cmp(&a.earnings())
                    .then_with(|| b.wins().cmp(&a.wins()))
            })
            .await)
    }
    async fn population(&self) -> Result<i64, Error> {
        Ok(self.accounts.read().await.values().filter(|a| a.active()).count() as i64)
    }
}

impl MemoryVault {
    async fn ranked<F>(&self, limit: i64, order: F) -> Vec<Account>
    where
        F: Fn(&Account, &Account) -> std::cmp::Ordering,
    {
        let mut ranked = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.active())
            .cloned()
            .collect::<Vec<_>>();
        ranked.sort_by(order);
        ranked.truncate(limit.max(0) as usize);
        ranked
    }
}
