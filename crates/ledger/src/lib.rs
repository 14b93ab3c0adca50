//! Accounts and the balance ledger.
//!
//! The [`Ledger`] is the only code path that mutates an account. Every
//! mutation is an optimistic compare-and-swap on the account's version, so
//! concurrent deposits, wagers and payouts against the same account can
//! never lose an update.
//!
//! ## Core Types
//!
//! - [`Account`] — Player identity, balance, rating and lifetime stats
//! - [`Vault`] — Versioned account storage
//! - [`Ledger`] — Credit, debit and transfer with bounded retry
//! - [`MemoryVault`] — In-process vault for tests and database-less runs
mod account;
mod ledger;
mod memory;
mod vault;

pub use account::*;
pub use ledger::*;
pub use memory::*;
pub use vault::*;

#[cfg(feature = "database")]
mod postgres;
