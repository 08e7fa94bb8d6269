//! Path-keyed permission grants fetched from the remote authority.

use crate::error::{AuthzError, Result};
use std::collections::HashMap;
use treegate_types::AccessLevel;

/// Delimiter between the level and the path in a raw grant string.
const GRANT_DELIMITER: char = ':';

/// Immutable mapping from an absolute in-repository path to an access
/// level.
///
/// Built once per cache refresh from the authority's raw grant list and
/// never mutated in place; a refresh replaces the whole map. A path
/// absent from the map means "no explicit grant at that exact path",
/// not "denied" - denial falls out of the ancestor walk finding nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionMap {
    entries: HashMap<String, AccessLevel>,
}

impl PermissionMap {
    /// Parse a raw grant list of `"<level>:<path>"` strings.
    ///
    /// Any malformed entry aborts the whole refresh: applying a partial
    /// permission set is security-significant. A later duplicate path
    /// overwrites an earlier one.
    pub fn parse<S: AsRef<str>>(grants: &[S]) -> Result<Self> {
        let mut entries = HashMap::with_capacity(grants.len());
        for grant in grants {
            let grant = grant.as_ref();
            let (level, path) = grant
                .split_once(GRANT_DELIMITER)
                .ok_or_else(|| AuthzError::MalformedGrant(grant.to_string()))?;
            let level = AccessLevel::parse(level)
                .ok_or_else(|| AuthzError::MalformedGrant(grant.to_string()))?;
            if !path.starts_with('/') {
                return Err(AuthzError::MalformedGrant(grant.to_string()));
            }
            let path = if path.len() > 1 {
                path.trim_end_matches('/').to_string()
            } else {
                path.to_string()
            };
            entries.insert(path, level);
        }
        Ok(Self { entries })
    }

    /// Explicit level at exactly `path`, if any.
    pub fn level_at(&self, path: &str) -> Option<AccessLevel> {
        self.entries.get(path).copied()
    }

    /// Nearest ancestor (including `path` itself) with an explicit grant.
    ///
    /// Walks from the full path upward one segment at a time, down to and
    /// including the root `/`. The first hit wins; each step is strictly
    /// shorter, so ties cannot occur.
    pub fn nearest_ancestor(&self, path: &str) -> Option<(&str, AccessLevel)> {
        let mut candidate = path;
        loop {
            if let Some((key, level)) = self.entries.get_key_value(candidate) {
                return Some((key.as_str(), *level));
            }
            if candidate == "/" {
                return None;
            }
            candidate = match candidate.rfind('/') {
                Some(0) | None => "/",
                Some(idx) => &candidate[..idx],
            };
        }
    }

    /// Entries at or below `path`.
    ///
    /// Prefix matching is segment-boundary aware: `/ab` is not below
    /// `/a`, and `/` matches everything.
    pub fn at_or_below<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Iterator<Item = (&'a str, AccessLevel)> + 'a {
        self.entries.iter().filter_map(move |(entry, level)| {
            if is_at_or_below(entry, path) {
                Some((entry.as_str(), *level))
            } else {
                None
            }
        })
    }

    /// Number of explicit grants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no grants at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True when `candidate` equals `root` or lies inside its subtree.
fn is_at_or_below(candidate: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    candidate == root
        || (candidate.len() > root.len()
            && candidate.starts_with(root)
            && candidate.as_bytes()[root.len()] == b'/')
}
