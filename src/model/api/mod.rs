//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as timestamps.

pub mod auth;
pub mod candidate;
pub mod id;
pub mod results;
pub mod session;
pub mod voter;
