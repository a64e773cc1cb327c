//! Data types and the election engine.
//!
//! - [`db`]: records as they are persisted.
//! - [`api`]: request and response bodies.
//! - [`store`]: the persistence interface, plus an in-memory implementation.
//! - [`mongodb`]: the MongoDB implementation of that interface.
//! - [`election`]: the voting rules, built on top of a store.

pub mod api;
pub mod db;
pub mod election;
pub mod mongodb;
pub mod store;
