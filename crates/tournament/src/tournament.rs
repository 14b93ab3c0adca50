use serde::Deserialize;
use serde::Serialize;
use sm_core::*;
use sm_gameroom::TimeControl;
use sm_ledger::Account;
use std::time::SystemTime;

/// `open → active → completed`, `open → cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Open,
    Active,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TournamentStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(Error::invalid(format!("unknown tournament status {}", s))),
        }
    }
}

/// A winner-take-all tournament.
///
/// While open, `pool == fee × entrants` and `entrants <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    id: ID<Self>,
    organizer: ID<Account>,
    name: String,
    description: String,
    fee: Amount,
    capacity: i32,
    entrants: i32,
    pool: Amount,
    control: TimeControl,
    status: TournamentStatus,
    winner: Option<ID<Account>>,
    round: Round,
    #[serde(with = "sm_core::epoch")]
    created: SystemTime,
    #[serde(with = "sm_core::epoch::option")]
    started: Option<SystemTime>,
    #[serde(with = "sm_core::epoch::option")]
    ended: Option<SystemTime>,
}

impl Tournament {
    pub fn new(
        organizer: ID<Account>,
        name: &str,
        description: &str,
        fee: Amount,
        capacity: i32,
        control: TimeControl,
    ) -> Result<Self, Error> {
        let name = name.trim();
        if name.chars().count() < 3 || name.chars().count() > 64 {
            return Err(Error::invalid("name must be 3-64 characters"));
        }
        if description.chars().count() > 500 {
            return Err(Error::invalid("description exceeds 500 characters"));
        }
        if fee.is_negative() || fee > MAX_WAGER {
            return Err(Error::invalid(format!("entry fee must lie between 0 and {} SOL", MAX_WAGER)));
        }
        if !(MIN_ENTRANTS..=MAX_ENTRANTS).contains(&capacity) {
            return Err(Error::invalid(format!(
                "capacity must lie between {} and {}",
                MIN_ENTRANTS, MAX_ENTRANTS
            )));
        }
        Ok(Self {
            id: ID::default(),
            organizer,
            name: name.to_string(),
            description: description.trim().to_string(),
            fee,
            capacity,
            entrants: 0,
            pool: Amount::ZERO,
            control,
            status: TournamentStatus::Open,
            winner: None,
            round: 0,
            created: SystemTime::now(),
            started: None,
            ended: None,
        })
    }

    pub fn organizer(&self) -> ID<Account> {
        self.organizer
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn fee(&self) -> Amount {
        self.fee
    }
    pub fn capacity(&self) -> i32 {
        self.capacity
    }
    pub fn entrants(&self) -> i32 {
        self.entrants
    }
    pub fn pool(&self) -> Amount {
        self.pool
    }
    pub fn control(&self) -> TimeControl {
        self.control
    }
    pub fn status(&self) -> TournamentStatus {
        self.status
    }
    pub fn winner(&self) -> Option<ID<Account>> {
        self.winner
    }
    pub fn round(&self) -> Round {
        self.round
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    pub fn started(&self) -> Option<SystemTime> {
        self.started
    }
    pub fn ended(&self) -> Option<SystemTime> {
        self.ended
    }
    pub fn is_full(&self) -> bool {
        self.entrants >= self.capacity
    }
}

impl Tournament {
    /// Counts one more entrant and their fee.
    pub fn admit(&mut self) -> Result<(), Error> {
        if self.is_full() {
            return Err(Error::TournamentFull);
        }
        if self.status != TournamentStatus::Open {
            return Err(Error::NotOpen);
        }
        self.pool = self
            .pool
            .checked_add(self.fee)
            .ok_or_else(|| Error::invalid("prize pool overflow"))?;
        self.entrants += 1;
        Ok(())
    }
    pub fn start(&mut self) -> Result<(), Error> {
        if self.status != TournamentStatus::Open {
            return Err(Error::NotOpen);
        }
        if self.entrants < MIN_ENTRANTS {
            return Err(Error::transition(format!(
                "at least {} entrants are needed to start",
                MIN_ENTRANTS
            )));
        }
        self.status = TournamentStatus::Active;
        self.round = 1;
        self.started = Some(SystemTime::now());
        Ok(())
    }
    pub fn next_round(&mut self) -> Result<Round, Error> {
        match self.status {
            TournamentStatus::Active => {
                self.round += 1;
                Ok(self.round)
            }
            _ => Err(Error::transition("only active tournaments advance")),
        }
    }
    /// Crowns `winner` and returns the prize to pay them.
    pub fn conclude(&mut self, winner: ID<Account>) -> Result<Amount, Error> {
        match self.status {
            TournamentStatus::Active => {}
            TournamentStatus::Completed => return Err(Error::AlreadySettled),
            _ => return Err(Error::transition("only active tournaments can conclude")),
        }
        self.status = TournamentStatus::Completed;
        self.winner = Some(winner);
        self.ended = Some(SystemTime::now());
        Ok(self.pool)
    }
    /// Calls off an open tournament and returns the fee owed to each entrant.
    pub fn cancel(&mut self) -> Result<Amount, Error> {
        if self.status != TournamentStatus::Open {
            return Err(Error::NotOpen);
        }
        self.status = TournamentStatus::Cancelled;
        self.ended = Some(SystemTime::now());
        Ok(self.fee)
    }
}

impl Unique for Tournament {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Tournament {
        fn name() -> &'static str {
            TOURNAMENTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TOURNAMENTS,
                " (
                    id          UUID PRIMARY KEY,
                    organizer   UUID NOT NULL REFERENCES ",
                ACCOUNTS,
                "(id),
                    name        VARCHAR(64) NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    fee         BIGINT NOT NULL CHECK (fee >= 0),
                    capacity    INTEGER NOT NULL CHECK (capacity BETWEEN 2 AND 64),
                    entrants    INTEGER NOT NULL DEFAULT 0 CHECK (entrants <= capacity),
                    pool        BIGINT NOT NULL DEFAULT 0,
                    control     TEXT NOT NULL,
                    status      TEXT NOT NULL,
                    winner      UUID REFERENCES ",
                ACCOUNTS,
                "(id),
                    round       INTEGER NOT NULL DEFAULT 0,
                    created     TIMESTAMPTZ NOT NULL,
                    started     TIMESTAMPTZ,
                    ended       TIMESTAMPTZ
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_tournaments_status ON ",
                TOURNAMENTS,
                " (status);"
            )
        }
    }

    impl TryFrom<&tokio_postgres::Row> for Tournament {
        type Error = Error;
        fn try_from(row: &tokio_postgres::Row) -> Result<Self, Self::Error> {
            Ok(Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                organizer: ID::from(row.get::<_, uuid::Uuid>(1)),
                name: row.get::<_, String>(2),
                description: row.get::<_, String>(3),
                fee: Amount::lamports(row.get::<_, i64>(4)),
                capacity: row.get::<_, i32>(5),
                entrants: row.get::<_, i32>(6),
                pool: Amount::lamports(row.get::<_, i64>(7)),
                control: row.get::<_, &str>(8).parse()?,
                status: row.get::<_, &str>(9).parse()?,
                winner: row.get::<_, Option<uuid::Uuid>>(10).map(ID::from),
                round: row.get::<_, Round>(11),
                created: row.get::<_, SystemTime>(12),
                started: row.get::<_, Option<SystemTime>>(13),
                ended: row.get::<_, Option<SystemTime>>(14),
            })
        }
    }
}
