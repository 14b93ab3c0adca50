use super::*;
use serde::Serialize;
use sm_core::*;
use sm_ledger::Account;
use std::time::SystemTime;

/// Money owed to an account when a game reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payout {
    /// Winnings, of which `profit` was staked by the other side.
    Prize {
        to: ID<Account>,
        amount: Amount,
        profit: Amount,
    },
    /// An escrowed wager going back to whoever paid it.
    Refund { to: ID<Account>, amount: Amount },
}

/// A wagered or bracket chess game.
///
/// Transitions on this type are pure: they validate, mutate and report
/// what the registry must pay out, but never touch storage or balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    id: ID<Self>,
    creator: ID<Account>,
    opponent: Option<ID<Account>>,
    wager: Amount,
    control: TimeControl,
    status: Status,
    winner: Option<ID<Account>>,
    position: String,
    ply: Ply,
    rated: bool,
    bracket: bool,
    #[serde(with = "sm_core::epoch")]
    created: SystemTime,
    #[serde(with = "sm_core::epoch::option")]
    started: Option<SystemTime>,
    #[serde(with = "sm_core::epoch::option")]
    completed: Option<SystemTime>,
}

impl Game {
    /// An open game whose wager has already been escrowed from `creator`.
    pub fn new(creator: ID<Account>, wager: Amount, control: TimeControl) -> Self {
        Self {
            id: ID::default(),
            creator,
            opponent: None,
            wager,
            control,
            status: Status::Waiting,
            winner: None,
            position: START.to_string(),
            ply: 0,
            rated: false,
            bracket: false,
            created: SystemTime::now(),
            started: None,
            completed: None,
        }
    }
    /// A zero-wager tournament game, already under way.
    pub fn bracket(creator: ID<Account>, opponent: ID<Account>, control: TimeControl) -> Self {
        let now = SystemTime::now();
        Self {
            opponent: Some(opponent),
            wager: Amount::ZERO,
            status: Status::Active,
            bracket: true,
            started: Some(now),
            created: now,
            ..Self::new(creator, Amount::ZERO, control)
        }
    }

    pub fn creator(&self) -> ID<Account> {
        self.creator
    }
    pub fn opponent(&self) -> Option<ID<Account>> {
        self.opponent
    }
    pub fn wager(&self) -> Amount {
        self.wager
    }
    pub fn control(&self) -> TimeControl {
        self.control
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn winner(&self) -> Option<ID<Account>> {
        self.winner
    }
    pub fn position(&self) -> &str {
        &self.position
    }
    pub fn ply(&self) -> Ply {
        self.ply
    }
    pub fn rated(&self) -> bool {
        self.rated
    }
    pub fn is_bracket(&self) -> bool {
        self.bracket
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    pub fn started(&self) -> Option<SystemTime> {
        self.started
    }
    pub fn completed(&self) -> Option<SystemTime> {
        self.completed
    }
    pub fn is_participant(&self, account: ID<Account>) -> bool {
        self.creator == account || self.opponent == Some(account)
    }
    /// The participant who is not `account`.
    pub fn other(&self, account: ID<Account>) -> Option<ID<Account>> {
        match self.opponent {
            Some(opponent) if account == self.creator => Some(opponent),
            Some(opponent) if account == opponent => Some(self.creator),
            _ => None,
        }
    }
    /// The creator moves on even plies.
    pub fn to_move(&self) -> Option<ID<Account>> {
        match self.ply % 2 {
            0 => Some(self.creator),
            _ => self.opponent,
        }
    }
    /// Funds currently held by this game.
    pub fn escrow(&self) -> Amount {
        match self.status {
            Status::Waiting => self.wager,
            Status::Active => Amount::lamports(self.wager.inner() * 2),
            _ => Amount::ZERO,
        }
    }
}

impl Game {
    pub fn join(&mut self, opponent: ID<Account>) -> Result<(), Error> {
        if self.status != Status::Waiting {
            return Err(Error::GameNotJoinable);
        }
        if self.creator == opponent {
            return Err(Error::SelfJoin);
        }
        self.opponent = Some(opponent);
        self.status = Status::Active;
        self.started = Some(SystemTime::now());
        Ok(())
    }

    /// Checks that `mover` may move now.
    pub fn check(&self, mover: ID<Account>) -> Result<(), Error> {
        if !self.is_participant(mover) {
            return Err(Error::NotAParticipant);
        }
        match self.status {
            Status::Active if self.to_move() == Some(mover) => Ok(()),
            Status::Active => Err(Error::OutOfTurn),
            s if s.is_terminal() => Err(Error::AlreadySettled),
            _ => Err(Error::transition("game has not started")),
        }
    }

    /// Appends a validated move and returns its log entry.
    pub fn advance(&mut self, mover: ID<Account>, notation: &str, position: String) -> Move {
        let entry = Move::new(self.id, self.ply, mover, notation.to_string(), position.clone());
        self.ply += 1;
        self.position = position;
        entry
    }

    pub fn settle(&mut self, outcome: Outcome) -> Result<Vec<Payout>, Error> {
        match self.status {
            Status::Active => {}
            s if s.is_terminal() => return Err(Error::AlreadySettled),
            _ => return Err(Error::transition("only active games can be settled")),
        }
        let opponent = self.opponent.ok_or_else(|| Error::transition("game has no opponent"))?;
        let pot = self.escrow();
        self.status = Status::Completed;
        self.completed = Some(SystemTime::now());
        self.winner = match outcome {
            Outcome::CreatorWins => Some(self.creator),
            Outcome::OpponentWins => Some(opponent),
            Outcome::Draw => None,
        };
        let payouts = match self.winner {
            Some(to) => vec![Payout::Prize {
                to,
                amount: pot,
                profit: self.wager,
            }],
            None => vec![
                Payout::Refund {
                    to: self.creator,
                    amount: self.wager,
                },
                Payout::Refund {
                    to: opponent,
                    amount: self.wager,
                },
            ],
        };
        Ok(self.positive(payouts))
    }

    pub fn cancel(&mut self, reason: Reason) -> Result<Vec<Payout>, Error> {
        let payers = match (self.status, reason, self.opponent) {
            (s, _, _) if s.is_terminal() => return Err(Error::AlreadySettled),
            (Status::Waiting, Reason::Withdrawn, _) => vec![self.creator],
            (Status::Active, Reason::Abandoned, Some(opponent)) => vec![self.creator, opponent],
            (status, reason, _) => {
                return Err(Error::transition(format!(
                    "cannot cancel a {} game as {:?}",
                    status, reason
                )));
            }
        };
        self.status = Status::Cancelled;
        self.completed = Some(SystemTime::now());
        let payouts = payers
            .into_iter()
            .map(|to| Payout::Refund {
                to,
                amount: self.wager,
            })
            .collect();
        Ok(self.positive(payouts))
    }

    /// Marks the game rated. Returns false if it already was.
    pub fn rate(&mut self) -> bool {
        !std::mem::replace(&mut self.rated, true)
    }

    /// Bracket games escrow nothing, so they pay nothing.
    fn positive(&self, payouts: Vec<Payout>) -> Vec<Payout> {
        payouts
            .into_iter()
            .filter(|p| match p {
                Payout::Prize { amount, .. } | Payout::Refund { amount, .. } => amount.is_positive(),
            })
            .collect()
    }
}

impl Unique for Game {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Game {
        fn name() -> &'static str {
            GAMES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                GAMES,
                " (
                    id          UUID PRIMARY KEY,
                    creator     UUID NOT NULL REFERENCES ",
                ACCOUNTS,
                "(id),
                    opponent    UUID REFERENCES ",
                ACCOUNTS,
                "(id),
                    wager       BIGINT NOT NULL CHECK (wager >= 0),
                    control     TEXT NOT NULL,
                    status      TEXT NOT NULL,
                    winner      UUID REFERENCES ",
                ACCOUNTS,
                "(id),
                    position    TEXT NOT NULL,
                    ply         INTEGER NOT NULL DEFAULT 0,
                    rated       BOOLEAN NOT NULL DEFAULT FALSE,
                    bracket     BOOLEAN NOT NULL DEFAULT FALSE,
                    created     TIMESTAMPTZ NOT NULL,
                    started     TIMESTAMPTZ,
                    completed   TIMESTAMPTZ
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_games_status ON ",
                GAMES,
                " (status);
                 CREATE INDEX IF NOT EXISTS idx_games_creator ON ",
                GAMES,
                " (creator);
                 CREATE INDEX IF NOT EXISTS idx_games_opponent ON ",
                GAMES,
                " (opponent);"
            )
        }
    }

    impl TryFrom<&tokio_postgres::Row> for Game {
        type Error = Error;
        fn try_from(row: &tokio_postgres::Row) -> Result<Self, Self::Error> {
            Ok(Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                creator: ID::from(row.get::<_, uuid::Uuid>(1)),
                opponent: row.get::<_, Option<uuid::Uuid>>(2).map(ID::from),
                wager: Amount::lamports(row.get::<_, i64>(3)),
                control: row.get::<_, &str>(4).parse()?,
                status: row.get::<_, &str>(5).parse()?,
                winner: row.get::<_, Option<uuid::Uuid>>(6).map(ID::from),
                position: row.get::<_, String>(7),
                ply: row.get::<_, Ply>(8),
                rated: row.get::<_, bool>(9),
                bracket: row.get::<_, bool>(10),
                created: row.get::<_, SystemTime>(11),
                started: row.get::<_, Option<SystemTime>>(12),
                completed: row.get::<_, Option<SystemTime>>(13),
            })
        }
    }
}
