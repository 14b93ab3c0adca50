use super::*;
use sm_core::ID;
use sm_ledger::Account;

/// JWT payload binding a token to an account and the session that issued it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub sid: uuid::Uuid,
    pub usr: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(account: ID<Account>, session: ID<Session>, name: String) -> Self {
        let now = seconds();
        Self {
            sub: account.inner(),
            sid: session.inner(),
            usr: name,
            iat: now,
            exp: now + Crypto::duration().as_secs() as i64,
        }
    }
    pub fn expired(&self) -> bool {
        self.exp < seconds()
    }
    pub fn account(&self) -> ID<Account> {
        ID::from(self.sub)
    }
    pub fn session(&self) -> ID<Session> {
        ID::from(self.sid)
    }
    pub fn name(&self) -> &str {
        &self.usr
    }
}

fn seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
