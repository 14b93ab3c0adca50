//! Deposits and withdrawals.
//!
//! - [`Transfer`] — A deposit or withdrawal and its settlement state
//! - [`Cashier`] — Request, confirm and fail transfers against the ledger
//! - [`TransferRepository`] — Durable storage, in memory or PostgreSQL
//! - [`Payments`] — Card processor seam, [`Sandbox`] by default
mod cashier;
mod memory;
mod payments;
mod repository;
mod transfer;

pub use cashier::*;
pub use memory::*;
pub use payments::*;
pub use repository::*;
pub use transfer::*;

#[cfg(feature = "database")]
mod postgres;
