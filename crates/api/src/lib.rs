//! SAT Prep reminder API server library.
//!
//! Exposes config, state, error handling, routes, the batch jobs and the
//! background scheduler so integration tests and the binary entrypoint can
//! both access them.

pub mod background;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
