use super::*;
use serde::Serialize;
use sm_core::*;
use sm_ledger::Account;
use std::time::SystemTime;

/// A player's seat in a tournament. Seeds follow join order from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrant {
    tournament: ID<Tournament>,
    account: ID<Account>,
    seed: i32,
    #[serde(with = "sm_core::epoch")]
    joined: SystemTime,
    eliminated: bool,
    placement: Option<i32>,
}

impl Entrant {
    pub fn new(tournament: ID<Tournament>, account: ID<Account>, seed: i32) -> Self {
        Self {
            tournament,
            account,
            seed,
            joined: SystemTime::now(),
            eliminated: false,
            placement: None,
        }
    }
    pub fn tournament(&self) -> ID<Tournament> {
        self.tournament
    }
    pub fn account(&self) -> ID<Account> {
        self.account
    }
    pub fn seed(&self) -> i32 {
        self.seed
    }
    pub fn joined(&self) -> SystemTime {
        self.joined
    }
    pub fn eliminated(&self) -> bool {
        self.eliminated
    }
    pub fn placement(&self) -> Option<i32> {
        self.placement
    }
    pub fn eliminate(&mut self, placement: i32) {
        self.eliminated = true;
        self.placement = Some(placement);
    }
    pub fn place(&mut self, placement: i32) {
        self.placement = Some(placement);
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Entrant {
        fn name() -> &'static str {
            ENTRANTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                ENTRANTS,
                " (
                    tournament_id   UUID NOT NULL REFERENCES ",
                TOURNAMENTS,
                "(id) ON DELETE CASCADE,
                    account_id      UUID NOT NULL REFERENCES ",
                ACCOUNTS,
                "(id),
                    seed            INTEGER NOT NULL,
                    joined          TIMESTAMPTZ NOT NULL,
                    eliminated      BOOLEAN NOT NULL DEFAULT FALSE,
                    placement       INTEGER,
                    PRIMARY KEY (tournament_id, account_id)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_entrants_account ON ",
                ENTRANTS,
                " (account_id);"
            )
        }
    }

    impl From<&tokio_postgres::Row> for Entrant {
        fn from(row: &tokio_postgres::Row) -> Self {
            Self {
                tournament: ID::from(row.get::<_, uuid::Uuid>(0)),
                account: ID::from(row.get::<_, uuid::Uuid>(1)),
                seed: row.get::<_, i32>(2),
                joined: row.get::<_, SystemTime>(3),
                eliminated: row.get::<_, bool>(4),
                placement: row.get::<_, Option<i32>>(5),
            }
        }
    }
}
