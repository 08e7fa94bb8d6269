//! Common types used throughout `treegate`.
//!
//! This crate provides the value types shared between the authorization
//! engine, the remote-authority clients, and the gateway: access levels,
//! recursive modifiers, queries, decisions, and the typed cache key.

mod level;
mod query;

pub use level::{AccessLevel, Modifier};
pub use query::{AccessDecision, AccessQuery, CacheKey};
