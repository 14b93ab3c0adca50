use serde::Deserialize;
use serde::Serialize;
use sm_core::*;
use sm_ledger::Account;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub external_id: String,
    pub proof: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountInfo,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: ID<Account>,
    pub name: String,
    pub rating: Rating,
    pub balance: Amount,
    pub games: i32,
    pub wins: i32,
    pub win_rate: i32,
    pub earnings: Amount,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            name: account.name().to_string(),
            rating: account.rating(),
            balance: account.balance(),
            games: account.games(),
            wins: account.wins(),
            win_rate: account.win_rate(),
            earnings: account.earnings(),
        }
    }
}
