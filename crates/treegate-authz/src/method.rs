//! HTTP-method-to-access mapping.
//!
//! Kept as an explicit, swappable table rather than inline conditionals
//! so new operation kinds can be added without touching the resolution
//! algorithm.

use crate::error::{AuthzError, Result};
use std::collections::HashMap;
use treegate_types::{AccessLevel, Modifier};

/// What one method demands of the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRule {
    /// The access level the request needs.
    pub level: AccessLevel,
    /// Recursive qualifier, if the operation spans a subtree.
    pub modifier: Option<Modifier>,
    /// Granted without consulting the engine (protocol handshake).
    pub always_allow: bool,
}

impl MethodRule {
    /// A rule that requires `level`, optionally over a whole subtree.
    pub const fn of(level: AccessLevel, modifier: Option<Modifier>) -> Self {
        Self {
            level,
            modifier,
            always_allow: false,
        }
    }

    const fn open() -> Self {
        Self {
            level: AccessLevel::None,
            modifier: None,
            always_allow: true,
        }
    }
}

/// Mapping from HTTP/WebDAV method to its access requirement.
///
/// An unknown method is a configuration error, not a deny: it means the
/// deployment serves an operation this table was never told about.
#[derive(Debug, Clone)]
pub struct MethodTable {
    rules: HashMap<String, MethodRule>,
}

impl Default for MethodTable {
    /// The WebDAV table used by the Subversion frontend.
    fn default() -> Self {
        use AccessLevel::{Commit, View};

        let mut rules = HashMap::new();
        for method in ["GET", "HEAD", "PROPFIND", "REPORT", "CHECKOUT"] {
            rules.insert(method.to_string(), MethodRule::of(View, None));
        }
        for method in ["PUT", "MKCOL", "PROPPATCH", "MKACTIVITY", "MERGE", "LOCK", "UNLOCK"] {
            rules.insert(method.to_string(), MethodRule::of(Commit, None));
        }
        // Recursive destructive operations must hold over the subtree.
        rules.insert("DELETE".into(), MethodRule::of(Commit, Some(Modifier::All)));
        // COPY and MOVE authorize their source here; the destination is
        // separately authorized with `destination_rule`.
        rules.insert("COPY".into(), MethodRule::of(View, Some(Modifier::All)));
        rules.insert("MOVE".into(), MethodRule::of(View, Some(Modifier::All)));
        // Capability handshake, always granted.
        rules.insert("OPTIONS".into(), MethodRule::open());

        Self { rules }
    }
}

impl MethodTable {
    /// Look up the rule for `method`.
    pub fn rule(&self, method: &str) -> Result<MethodRule> {
        self.rules
            .get(method)
            .copied()
            .ok_or_else(|| AuthzError::UnknownMethod(method.to_string()))
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, method: impl Into<String>, rule: MethodRule) {
        self.rules.insert(method.into(), rule);
    }

    /// Requirement for a COPY/MOVE destination: recursive commit access.
    pub const fn destination_rule() -> MethodRule {
        MethodRule::of(AccessLevel::Commit, Some(Modifier::All))
    }
}
