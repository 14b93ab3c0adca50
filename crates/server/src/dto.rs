use serde::Deserialize;
use serde::Serialize;
use sm_core::*;
use sm_gameroom::TimeControl;
use sm_gameroom::Tally;
use sm_ledger::Account;
use sm_tournament::Tournament;
use sm_wallet::Method;
use std::time::SystemTime;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub wager: Amount,
    #[serde(default)]
    pub time_control: TimeControl,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub notation: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct SinceQuery {
    pub since: Option<Ply>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entry_fee: Amount,
    pub max_participants: i32,
    #[serde(default)]
    pub time_control: TimeControl,
}

#[derive(Deserialize)]
pub struct ConcludeRequest {
    pub winner: ID<Account>,
}

#[derive(Deserialize)]
pub struct DepositRequest {
    pub amount: Amount,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Deserialize)]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub address: String,
}

#[derive(Deserialize)]
pub struct IntentRequest {
    pub amount: Amount,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse<T: Serialize> {
    pub transfer: T,
    pub client_secret: String,
}

/// Body of a processor callback.
#[derive(Deserialize, Default)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: Amount,
}

#[derive(Deserialize)]
pub struct RatingRequest {
    pub rating: Rating,
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// One leaderboard row. Balances stay private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub id: ID<Account>,
    pub name: String,
    pub rating: Rating,
    pub games: i32,
    pub wins: i32,
    pub win_rate: i32,
    pub earnings: Amount,
}

impl From<&Account> for Standing {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            name: account.name().to_string(),
            rating: account.rating(),
            games: account.games(),
            wins: account.wins(),
            win_rate: account.win_rate(),
            earnings: account.earnings(),
        }
    }
}

/// Platform totals shown beside the leaderboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_players: i64,
    pub total_games: i64,
    pub total_prize_pool: Amount,
    pub active_tournaments: i64,
}

impl Stats {
    pub fn new(players: i64, tally: Tally, tournaments: i64) -> Self {
        Self {
            total_players: players,
            total_games: tally.games,
            total_prize_pool: tally.volume,
            active_tournaments: tournaments,
        }
    }
}

/// A completed tournament and who won it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Champion {
    pub id: ID<Tournament>,
    pub tournament_name: String,
    pub winner: ID<Account>,
    pub name: String,
    pub prize_amount: Amount,
    #[serde(with = "sm_core::epoch::option")]
    pub completed_at: Option<SystemTime>,
}

impl Champion {
    pub fn new(tournament: &Tournament, winner: &Account) -> Self {
        Self {
            id: tournament.id(),
            tournament_name: tournament.name().to_string(),
            winner: winner.id(),
            name: winner.name().to_string(),
            prize_amount: tournament.pool(),
            completed_at: tournament.ended(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub players: Vec<Standing>,
    pub stats: Stats,
    pub recent_winners: Vec<Champion>,
}

/// Ranking by net winnings.
#[derive(Debug, Serialize)]
pub struct Earners {
    pub players: Vec<Standing>,
}
