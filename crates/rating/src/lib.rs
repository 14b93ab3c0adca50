//! ELO ratings.
//!
//! - [`Score`] — a finished game from one player's point of view
//! - [`elo`] — expected score, K-factor and delta
//! - [`Ratings`] — applies deltas and game counts through the ledger
pub mod elo;
mod ratings;
mod score;

pub use ratings::*;
pub use score::*;
