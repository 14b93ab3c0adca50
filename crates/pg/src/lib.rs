//! PostgreSQL integration.
//!
//! Connectivity and schema management shared by every repository in the
//! workspace. Domain crates implement [`Schema`] for their records behind a
//! `database` feature and run SQL composed from the table constants below.
//!
//! ## Connectivity
//!
//! - [`db()`] — Establishes a database connection from `DB_URL`
//!
//! ## Schema
//!
//! - [`Schema`] — Table metadata and DDL generation
//! - [`migrate`] — Creates a table and its indices if absent
mod schema;

pub use schema::*;

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection.
///
/// Connects to PostgreSQL using the `DB_URL` environment variable.
/// Returns an `Arc<Client>` suitable for sharing across async tasks.
///
/// # Panics
///
/// Panics if `DB_URL` is not set or if connection fails.
pub async fn db() -> Arc<Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await
        .expect("set client_min_messages");
    Arc::new(client)
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for player accounts, balances and ratings.
#[rustfmt::skip]
pub const ACCOUNTS:    &str = "accounts";
/// Table for user authentication sessions.
#[rustfmt::skip]
pub const SESSIONS:    &str = "sessions";
/// Table for wagered and bracket games.
#[rustfmt::skip]
pub const GAMES:       &str = "games";
/// Table for per-game move logs.
#[rustfmt::skip]
pub const MOVES:       &str = "moves";
/// Table for per-game chat.
#[rustfmt::skip]
pub const CHATS:       &str = "chats";
/// Table for tournaments and their prize pools.
#[rustfmt::skip]
pub const TOURNAMENTS: &str = "tournaments";
/// Table for tournament participants.
#[rustfmt::skip]
pub const ENTRANTS:    &str = "entrants";
/// Table linking tournament rounds to games and byes.
#[rustfmt::skip]
pub const PAIRINGS:    &str = "pairings";
/// Table for deposits and withdrawals.
#[rustfmt::skip]
pub const TRANSFERS:   &str = "transfers";
