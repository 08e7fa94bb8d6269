//! Request-time path-based authorization for repository trees.
//!
//! This crate provides:
//! - **PermissionMap**: path-keyed access grants parsed from the remote
//!   authority's raw grant list
//! - **CacheStore**: a bounded, time-expiring cache of per-principal
//!   permission snapshots
//! - **PathResolver**: request-path parsing, including the `!svn`
//!   internal namespace rules
//! - **AccessEngine**: the resolution algorithm (ancestor walk plus the
//!   `All`/`Any` override scans)
//! - **MethodTable**: the swappable HTTP-method-to-access mapping
//!
//! # Example
//!
//! ```
//! use treegate_authz::{PathResolver, PermissionMap};
//! use treegate_types::AccessLevel;
//!
//! let map = PermissionMap::parse(&["commit:/trunk", "view:/"]).unwrap();
//! assert_eq!(
//!     map.nearest_ancestor("/trunk/src/main.rs"),
//!     Some(("/trunk", AccessLevel::Commit)),
//! );
//!
//! let resolver = PathResolver::new("/svn");
//! let parsed = resolver.parse("/svn/proj/trunk/src/main.rs").unwrap();
//! assert_eq!(parsed.repo_name, "proj");
//! assert_eq!(parsed.relative_path.as_deref(), Some("trunk/src/main.rs"));
//! ```

mod authority;
mod cache;
mod engine;
mod error;
mod grants;
mod method;
mod path;

pub use authority::{AuthorityError, ChangedPathsProvider, GlobalAccess, RemoteAuthority};
pub use cache::{CacheConfig, CacheEntry, CacheStore};
pub use engine::AccessEngine;
pub use error::{AuthzError, Result};
pub use grants::PermissionMap;
pub use method::{MethodRule, MethodTable};
pub use path::{ParsedPath, PathResolver};
