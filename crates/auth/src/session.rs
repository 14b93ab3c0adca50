use super::*;
use sm_core::ID;
use sm_core::Unique;
use sm_ledger::Account;
use std::time::SystemTime;

/// Persisted record of an issued token, checked on every request so that
/// logging out revokes the token before it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: ID<Self>,
    account: ID<Account>,
    hash: Vec<u8>,
    expires: SystemTime,
    revoked: bool,
}

impl Unique for Session {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

impl Session {
    pub fn new(id: ID<Self>, account: ID<Account>, hash: Vec<u8>) -> Self {
        Self {
            id,
            account,
            hash,
            expires: SystemTime::now() + Crypto::duration(),
            revoked: false,
        }
    }
    pub fn account(&self) -> ID<Account> {
        self.account
    }
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }
    pub fn expires_at(&self) -> SystemTime {
        self.expires
    }
    pub fn revoked(&self) -> bool {
        self.revoked
    }
    pub fn revoke(&mut self) {
        self.revoked = true;
    }
    pub fn is_live(&self) -> bool {
        !self.revoked && self.expires > SystemTime::now()
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Session {
        fn name() -> &'static str {
            SESSIONS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                SESSIONS,
                " (
                    id          UUID PRIMARY KEY,
                    account_id  UUID NOT NULL REFERENCES ",
                ACCOUNTS,
                "(id) ON DELETE CASCADE,
                    token_hash  BYTEA NOT NULL,
                    expires_at  TIMESTAMPTZ NOT NULL,
                    revoked     BOOLEAN NOT NULL DEFAULT FALSE
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_sessions_account ON ",
                SESSIONS,
                " (account_id);
                 CREATE INDEX IF NOT EXISTS idx_sessions_expires ON ",
                SESSIONS,
                " (expires_at) WHERE NOT revoked;"
            )
        }
    }

    impl From<&tokio_postgres::Row> for Session {
        fn from(row: &tokio_postgres::Row) -> Self {
            Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                account: ID::from(row.get::<_, uuid::Uuid>(1)),
                hash: row.get::<_, Vec<u8>>(2),
                expires: row.get::<_, SystemTime>(3),
                revoked: row.get::<_, bool>(4),
            }
        }
    }
}
