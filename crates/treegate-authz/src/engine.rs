//! The resolution algorithm: global shortcut, ancestor walk, and the
//! `All`/`Any` override scans.

use crate::authority::RemoteAuthority;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::grants::PermissionMap;
use std::sync::Arc;
use tracing::debug;
use treegate_types::{AccessDecision, AccessLevel, AccessQuery, CacheKey, Modifier};

/// Request-time access resolver over a shared cache and remote authority.
///
/// The engine never caches individual decisions; only the permission map
/// and the global flags are cached. The tree walk is bounded by path
/// depth and map size and is recomputed per query so modifier semantics
/// are honored exactly.
pub struct AccessEngine<A> {
    cache: Arc<CacheStore>,
    authority: A,
}

impl<A: RemoteAuthority> AccessEngine<A> {
    /// Create an engine around a shared cache and an authority client.
    pub fn new(cache: Arc<CacheStore>, authority: A) -> Self {
        Self { cache, authority }
    }

    /// The cache store, for explicit invalidation by callers.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Answer one access query.
    ///
    /// Remote failures propagate as errors, never as decisions; callers
    /// must fail closed.
    pub async fn resolve(
        &self,
        principal: &str,
        system_id: &str,
        query: &AccessQuery,
    ) -> Result<AccessDecision> {
        let key = CacheKey::new(system_id, &query.repo_name, principal);

        // Global shortcut: repository-wide write access, or repository-wide
        // read access for a read-only request, answers without the grant
        // list ever being fetched or parsed.
        let (global_read, global_write) = self.global_flags(&key).await?;
        if global_write || (global_read && query.level <= AccessLevel::View) {
            return Ok(AccessDecision::allow(Some("/".to_string())));
        }

        let permissions = self.permissions_for(&key).await?;

        // A query with no path at all asks whether anything in this
        // repository's map is reachable; `/` matches every entry.
        let (path, modifier) = match &query.relative_path {
            Some(path) => (repo_rooted(&query.repo_name, path), query.modifier),
            None => ("/".to_string(), Some(Modifier::Any)),
        };

        let decision = resolve_in_map(&permissions, &path, query.level, modifier);
        debug!(
            principal,
            repo = %query.repo_name,
            path,
            level = %query.level,
            ?modifier,
            granted = decision.granted,
            anchor = ?decision.anchor,
            "resolved access query"
        );
        Ok(decision)
    }

    /// Cached permission map for `key`, refreshed from the authority when
    /// absent or expired. The store lock is never held across the fetch,
    /// so concurrent misses for the same key may both fetch; the last
    /// insert wins and the snapshots are interchangeable.
    async fn permissions_for(&self, key: &CacheKey) -> Result<Arc<PermissionMap>> {
        if let Some(entry) = self.cache.get(key) {
            if let Some(permissions) = entry.permissions {
                return Ok(permissions);
            }
        }

        let grants = self
            .authority
            .fetch_grants(&key.principal, &key.system_id, &key.repo_name)
            .await?;
        let permissions = Arc::new(PermissionMap::parse(&grants)?);
        debug!(
            principal = %key.principal,
            repo = %key.repo_name,
            grants = permissions.len(),
            "refreshed permission map"
        );

        self.cache.set_permissions(key, permissions.clone());
        Ok(permissions)
    }

    /// Global read/write flags for `key`, computed lazily via the
    /// authority and cached alongside (or ahead of) the permission map.
    async fn global_flags(&self, key: &CacheKey) -> Result<(bool, bool)> {
        if let Some(entry) = self.cache.get(key) {
            if let (Some(read), Some(write)) = (entry.global_read, entry.global_write) {
                return Ok((read, write));
            }
        }

        let read = self
            .authority
            .fetch_global_access(&key.principal, &key.system_id, &key.repo_name, AccessLevel::View)
            .await?
            .all_descendants;
        let write = self
            .authority
            .fetch_global_access(&key.principal, &key.system_id, &key.repo_name, AccessLevel::Commit)
            .await?
            .all_descendants;

        self.cache.set_global_flags(key, read, write);
        Ok((read, write))
    }
}

/// Pure resolution over one permission map.
///
/// Phase one finds the nearest explicit grant on the ancestor chain;
/// phase two applies the optional override scan. Expressing the old
/// matrix of special cases as these two phases keeps every level and
/// modifier combination on the same code path.
fn resolve_in_map(
    map: &PermissionMap,
    path: &str,
    level: AccessLevel,
    modifier: Option<Modifier>,
) -> AccessDecision {
    let mut decision = match map.nearest_ancestor(path) {
        Some((anchor, granted)) => {
            if granted.satisfies(level) {
                AccessDecision::allow(Some(anchor.to_string()))
            } else {
                AccessDecision::deny(Some(anchor.to_string()))
            }
        }
        None => AccessDecision::deny(None),
    };

    match modifier {
        // Access to any descendant is enough. This deliberately reveals
        // that an otherwise unreadable ancestor directory exists, so a
        // user can browse down to the subtree they do have; see the
        // existence-leak test below.
        Some(Modifier::Any) if !decision.granted => {
            for (grant_path, granted) in map.at_or_below(path) {
                if granted.satisfies(level) {
                    decision = AccessDecision::allow(Some(grant_path.to_string()));
                    break;
                }
            }
        }
        // The access must hold for every explicit grant under the path;
        // one insufficient descendant revokes the base grant.
        Some(Modifier::All) if decision.granted => {
            for (grant_path, granted) in map.at_or_below(path) {
                if !granted.satisfies(level) {
                    decision = AccessDecision::deny(Some(grant_path.to_string()));
                    break;
                }
            }
        }
        _ => {}
    }

    decision
}

/// Root the relative query path at the repository name, matching the
/// space the authority's grant paths live in.
fn repo_rooted(repo_name: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        format!("/{repo_name}")
    } else {
        format!("/{repo_name}/{relative}")
    }
}
