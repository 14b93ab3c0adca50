use serde::Deserialize;
use serde::Serialize;
use sm_core::*;
use sm_ledger::Account;
use std::time::SystemTime;

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Deposit,
    Withdrawal,
}

/// How funds arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    Wallet,
    Card,
}

/// `pending → completed | failed`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

macro_rules! labels {
    ($ty:ty { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }
        impl std::str::FromStr for $ty {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    s => Err(Error::invalid(format!("unknown {} {}", stringify!($ty), s))),
                }
            }
        }
    };
}

labels!(Kind { Deposit => "deposit", Withdrawal => "withdrawal" });
labels!(Method { Wallet => "wallet", Card => "card" });
labels!(TransferStatus { Pending => "pending", Completed => "completed", Failed => "failed" });

/// Money moving into or out of a custodial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    id: ID<Self>,
    account: ID<Account>,
    kind: Kind,
    amount: Amount,
    method: Method,
    address: Option<String>,
    reference: Option<String>,
    status: TransferStatus,
    #[serde(with = "sm_core::epoch")]
    created: SystemTime,
    #[serde(with = "sm_core::epoch::option")]
    resolved: Option<SystemTime>,
}

impl Transfer {
    pub fn deposit(
        account: ID<Account>,
        amount: Amount,
        method: Method,
        reference: Option<String>,
    ) -> Result<Self, Error> {
        Self::positive(amount)?;
        Ok(Self {
            id: ID::default(),
            account,
            kind: Kind::Deposit,
            amount,
            method,
            address: None,
            reference: reference.filter(|r| !r.trim().is_empty()),
            status: TransferStatus::Pending,
            created: SystemTime::now(),
            resolved: None,
        })
    }
    pub fn withdrawal(account: ID<Account>, amount: Amount, address: &str) -> Result<Self, Error> {
        Self::positive(amount)?;
        let address = address.trim();
        if address.is_empty() || address.len() > 64 {
            return Err(Error::invalid("withdrawal address must be 1-64 characters"));
        }
        Ok(Self {
            id: ID::default(),
            account,
            kind: Kind::Withdrawal,
            amount,
            method: Method::Wallet,
            address: Some(address.to_string()),
            reference: None,
            status: TransferStatus::Pending,
            created: SystemTime::now(),
            resolved: None,
        })
    }
    fn positive(amount: Amount) -> Result<(), Error> {
        match amount.is_positive() {
            true => Ok(()),
            false => Err(Error::invalid("amount must be positive")),
        }
    }
    pub fn account(&self) -> ID<Account> {
        self.account
    }
    pub fn kind(&self) -> Kind {
        self.kind
    }
    pub fn amount(&self) -> Amount {
        self.amount
    }
    pub fn method(&self) -> Method {
        self.method
    }
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
    pub fn status(&self) -> TransferStatus {
        self.status
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    pub fn resolved(&self) -> Option<SystemTime> {
        self.resolved
    }

    /// Marks a pending transfer done, recording the external reference if given.
    pub fn complete(&self, reference: Option<String>) -> Result<Self, Error> {
        self.pending()?;
        Ok(Self {
            status: TransferStatus::Completed,
            reference: reference
                .filter(|r| !r.trim().is_empty())
                .or_else(|| self.reference.clone()),
            resolved: Some(SystemTime::now()),
            ..self.clone()
        })
    }
    pub fn fail(&self) -> Result<Self, Error> {
        self.pending()?;
        Ok(Self {
            status: TransferStatus::Failed,
            resolved: Some(SystemTime::now()),
            ..self.clone()
        })
    }
    fn pending(&self) -> Result<(), Error> {
        match self.status {
            TransferStatus::Pending => Ok(()),
            _ => Err(Error::AlreadySettled),
        }
    }
}

impl Unique for Transfer {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Transfer {
        fn name() -> &'static str {
            TRANSFERS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TRANSFERS,
                " (
                    id          UUID PRIMARY KEY,
                    account_id  UUID NOT NULL REFERENCES ",
                ACCOUNTS,
                "(id),
                    kind        TEXT NOT NULL,
                    amount      BIGINT NOT NULL CHECK (amount > 0),
                    method      TEXT NOT NULL,
                    address     TEXT,
                    reference   TEXT,
                    status      TEXT NOT NULL DEFAULT 'pending',
                    created     TIMESTAMPTZ NOT NULL,
                    resolved    TIMESTAMPTZ
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_transfers_account ON ",
                TRANSFERS,
                " (account_id, created DESC);"
            )
        }
    }

    impl TryFrom<&tokio_postgres::Row> for Transfer {
        type Error = Error;
        fn try_from(row: &tokio_postgres::Row) -> Result<Self, Self::Error> {
            Ok(Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                account: ID::from(row.get::<_, uuid::Uuid>(1)),
                kind: row.get::<_, &str>(2).parse()?,
                amount: Amount::lamports(row.get::<_, i64>(3)),
                method: row.get::<_, &str>(4).parse()?,
                address: row.get::<_, Option<String>>(5),
                reference: row.get::<_, Option<String>>(6),
                status: row.get::<_, &str>(7).parse()?,
                created: row.get::<_, SystemTime>(8),
                resolved: row.get::<_, Option<SystemTime>>(9),
            })
        }
    }
}
