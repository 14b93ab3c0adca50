//! Authentication and session management.
//!
//! Identity is vouched for by an external [`Provider`]; this crate turns a
//! verified proof into a JWT bound to a revocable [`Session`].
//!
//! ## Tokens
//!
//! - [`Crypto`] — JWT signing and verification
//! - [`Claims`] — JWT payload structure
//! - [`Session`] — Issued token with expiry and revocation flag
//! - [`Authority`] — Login, verification and logout
//!
//! ## Seams
//!
//! - [`Provider`] — External identity verification, [`Shared`] by default
//! - [`AuthRepository`] — Session storage, in memory or PostgreSQL
mod authority;
mod claims;
mod crypto;
mod dto;
mod provider;
mod repository;
mod session;

pub use authority::*;
pub use claims::*;
pub use crypto::*;
pub use dto::*;
pub use provider::*;
pub use repository::*;
pub use session::*;

#[cfg(feature = "database")]
mod postgres;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod middleware;
#[cfg(feature = "server")]
mod reply;
#[cfg(feature = "server")]
pub use handlers::*;
#[cfg(feature = "server")]
pub use middleware::*;
#[cfg(feature = "server")]
pub use reply::*;
