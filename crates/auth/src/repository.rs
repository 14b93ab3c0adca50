use super::*;
use sm_core::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage for issued sessions.
#[async_trait::async_trait]
pub trait AuthRepository: Send + Sync {
    async fn signin(&self, session: &Session) -> Result<(), Error>;
    async fn fetch(&self, id: ID<Session>) -> Result<Option<Session>, Error>;
    async fn revoke(&self, id: ID<Session>) -> Result<(), Error>;
}

/// In-process [`AuthRepository`].
#[derive(Default)]
pub struct MemorySessions {
    sessions: RwLock<HashMap<ID<Session>, Session>>,
}

#[async_trait::async_trait]
impl AuthRepository for MemorySessions {
    async fn signin(&self, session: &Session) -> Result<(), Error> {
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        Ok(())
    }
    async fn fetch(&self, id: ID<Session>) -> Result<Option<Session>, Error> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }
    async fn revoke(&self, id: ID<Session>) -> Result<(), Error> {
        self.sessions
            .write()
            .await
            .get_mut(&id)
            .map(Session::revoke)
            .ok_or(Error::NotFound)
    }
}
