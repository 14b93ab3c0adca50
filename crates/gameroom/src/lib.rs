//! Wagered chess games.
//!
//! The [`Registry`] owns the lifecycle of every game: escrowing wagers
//! through the ledger, validating turn order, consulting the external
//! [`Rules`] oracle, persisting moves and chat, and settling or cancelling
//! with exactly one payout.
//!
//! ## Records
//!
//! - [`Game`] — Status machine with pure, storage-free transitions
//! - [`Move`] — One entry of a game's move log
//! - [`ChatMessage`] — Immutable room chat
//!
//! ## Seams
//!
//! - [`GameRepository`] — Durable storage, in memory or PostgreSQL
//! - [`Rules`] — Chess rules oracle
//! - [`Observer`] — Told about every game that reaches a terminal state
mod control;
mod game;
mod listing;
mod memory;
mod observer;
mod record;
mod registry;
mod repository;
mod rules;
mod status;

pub use control::*;
pub use game::*;
pub use listing::*;
pub use memory::*;
pub use observer::*;
pub use record::*;
pub use registry::*;
pub use repository::*;
pub use rules::*;
pub use status::*;

#[cfg(feature = "database")]
mod postgres;
