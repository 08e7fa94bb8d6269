//! Access levels and recursive modifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse access level granted at a repository path.
///
/// Levels are ordered: None < View < Commit. A grant at a path is
/// implicitly inherited by every descendant until overridden by a
/// deeper grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No access at all.
    None,
    /// Read-only access (browse, checkout).
    View,
    /// Read and write access (commit).
    Commit,
}

impl AccessLevel {
    /// Check whether this level satisfies the required level.
    pub fn satisfies(&self, required: AccessLevel) -> bool {
        *self >= required
    }

    /// Parse the wire spelling used in grant strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(AccessLevel::None),
            "view" => Some(AccessLevel::View),
            "commit" => Some(AccessLevel::Commit),
            _ => None,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::None => write!(f, "none"),
            AccessLevel::View => write!(f, "view"),
            AccessLevel::Commit => write!(f, "commit"),
        }
    }
}

/// Recursive qualifier on an access query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// The access must hold for every explicit grant at or below the path.
    /// Used by operations that touch a whole subtree (delete, copy, move).
    All,
    /// The access must hold for at least one grant at or below the path.
    Any,
}
