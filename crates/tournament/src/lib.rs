//! Single-elimination tournaments with a winner-take-all prize pool.
//!
//! Entry fees are debited into the pool on registration. Once started,
//! [`Tournaments`] pairs the standing entrants in seed order, plays each
//! pairing as a zero-wager bracket game in the [`sm_gameroom::Registry`]
//! and advances the bracket as results come in.
mod engine;
mod entrant;
mod memory;
mod pairing;
mod repository;
mod tournament;

pub use engine::*;
pub use entrant::*;
pub use memory::*;
pub use pairing::*;
pub use repository::*;
pub use tournament::*;

#[cfg(feature = "database")]
mod postgres;
