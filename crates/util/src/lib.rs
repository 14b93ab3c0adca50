//! Core identifiers, amounts, errors, and constants for stakemate.
//!
//! This crate provides the foundational types and tuning parameters
//! used throughout the stakemate workspace.
//!
//! - [`ID`] — typed uuid wrapper for every persisted entity
//! - [`Amount`] — fixed-point SOL amount stored as lamports
//! - [`Error`] — the error taxonomy shared by every component
//! - [`epoch`] — serde helpers for millisecond timestamps
mod amount;
mod error;
mod id;
pub mod epoch;

pub use amount::*;
pub use error::*;
pub use id::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// ELO skill estimate.
pub type Rating = i32;
/// Zero-based index into a game's move log.
pub type Ply = i32;
/// Tournament round number, starting at 1.
pub type Round = i32;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// RATINGS
// ============================================================================
/// Rating assigned to every new account.
pub const DEFAULT_RATING: Rating = 1200;
/// Rating gap above which joining a game asks the client for confirmation.
pub const MAX_RATING_GAP: Rating = 300;
/// K-factor for accounts still inside their provisional period.
pub const K_PROVISIONAL: f64 = 40.0;
/// K-factor for established accounts below the master threshold.
pub const K_ESTABLISHED: f64 = 20.0;
/// K-factor for accounts at or above the master threshold.
pub const K_MASTER: f64 = 10.0;
/// Games played before an account leaves the provisional period.
pub const PROVISIONAL_GAMES: i32 = 30;
/// Rating at which the K-factor drops to its floor.
pub const MASTER_RATING: Rating = 2400;

// ============================================================================
// WAGERS & TOURNAMENTS
// ============================================================================
/// Smallest wager accepted for an open game (0.01 SOL).
pub const MIN_WAGER: Amount = Amount::lamports(10_000_000);
/// Largest wager accepted for an open game (100 SOL).
pub const MAX_WAGER: Amount = Amount::lamports(100 * LAMPORTS_PER_SOL);
/// Fewest entrants a tournament may be created for.
pub const MIN_ENTRANTS: i32 = 2;
/// Most entrants a tournament may be created for.
pub const MAX_ENTRANTS: i32 = 64;

// ============================================================================
// LEDGER
// ============================================================================
/// Compare-and-swap attempts before a ledger write reports contention.
pub const LEDGER_ATTEMPTS: usize = 8;

// ============================================================================
// REALTIME
// ============================================================================
/// How long a dropped player may take to reconnect before forfeiting.
pub const GRACE_PERIOD: std::time::Duration = std::time::Duration::from_secs(30);
/// Maximum characters in a chat message.
pub const CHAT_LIMIT: usize = 500;
/// Rows returned by the leaderboard.
pub const LEADERBOARD_SIZE: i64 = 50;
/// Completed tournaments shown beside the leaderboard.
pub const RECENT_WINNERS: i64 = 10;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// Pending grace timers are dropped; their games are picked up as active on restart.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}

/// Milliseconds since the unix epoch, for wire timestamps.
pub fn millis(time: std::time::SystemTime) -> i64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
