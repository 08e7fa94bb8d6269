//! Queries, decisions, and the cache key.

use crate::level::{AccessLevel, Modifier};
use serde::{Deserialize, Serialize};

/// One authorization question posed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessQuery {
    /// Repository the query is scoped to.
    pub repo_name: String,
    /// In-repository path, relative, without a leading slash. `None`
    /// means "the repository root, unqualified" and forces the `Any`
    /// modifier during resolution.
    pub relative_path: Option<String>,
    /// The access the request needs.
    pub level: AccessLevel,
    /// Optional recursive qualifier.
    pub modifier: Option<Modifier>,
}

impl AccessQuery {
    /// Create a query.
    pub fn new(
        repo_name: impl Into<String>,
        relative_path: Option<String>,
        level: AccessLevel,
        modifier: Option<Modifier>,
    ) -> Self {
        Self {
            repo_name: repo_name.into(),
            relative_path,
            level,
            modifier,
        }
    }
}

/// The outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the requested access is granted.
    pub granted: bool,
    /// The permission-map path the decision hinged on, for diagnostics.
    pub anchor: Option<String>,
}

impl AccessDecision {
    /// A grant, anchored at the path that produced it.
    pub fn allow(anchor: Option<String>) -> Self {
        Self { granted: true, anchor }
    }

    /// A denial, anchored at the path that produced it (if any).
    pub fn deny(anchor: Option<String>) -> Self {
        Self { granted: false, anchor }
    }
}

/// Typed cache key: one entry per (system, repository, principal).
///
/// The key is a struct rather than a composed string so that two keys
/// can never collide through delimiter characters in their parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// External system the repository belongs to.
    pub system_id: String,
    /// Repository name.
    pub repo_name: String,
    /// The principal being authorized.
    pub principal: String,
}

impl CacheKey {
    /// Create a key.
    pub fn new(
        system_id: impl Into<String>,
        repo_name: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            repo_name: repo_name.into(),
            principal: principal.into(),
        }
    }
}
