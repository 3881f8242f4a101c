//! Domain logic for the SAT study reminder engine.
//!
//! Everything in this crate is pure: no database, no network, no clocks
//! other than the injectable [`clock::Clock`]. The `db`, `api` and `client`
//! crates build their I/O on top of it.

pub mod clock;
pub mod error;
pub mod idempotency;
pub mod message_tokens;
pub mod premium;
pub mod reminder;
pub mod timer;
pub mod timeutil;
pub mod types;
