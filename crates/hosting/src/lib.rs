//! Realtime game rooms over WebSocket.
//!
//! Each account holds at most one live connection and each connection sits
//! in at most one game room. Moves and chat go through the registry first
//! and are fanned out to the room afterwards. A player who drops out of an
//! active game has [`GRACE_PERIOD`](sm_core::GRACE_PERIOD) to come back
//! before the game is abandoned. Leaving for good is a `resign` message.
//!
//! - [`Hub`] — Authentication, room routing and disconnect grace
//! - [`Table`] — Connection table guarded by the hub's single lock
//! - [`ClientMessage`] / [`ServerMessage`] — The JSON wire protocol
mod bridge;
mod hub;
mod message;
mod table;

pub use hub::*;
pub use message::*;
pub use table::*;
