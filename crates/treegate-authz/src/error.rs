//! Error types for the authorization engine.
//!
//! Every variant is distinguishable from a legitimate deny: a deny is a
//! successful resolution with `granted == false`, an error means the
//! engine could not decide. Callers must treat errors as fail-closed.

use crate::authority::AuthorityError;
use thiserror::Error;

/// Errors that can occur while resolving an access query.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A raw grant string from the authority could not be parsed. The
    /// whole refresh is aborted; a partial permission set must never be
    /// applied.
    #[error("malformed grant string: {0:?}")]
    MalformedGrant(String),

    /// The request path could not be split into (repository, path).
    #[error("malformed request path: {0:?}")]
    MalformedPath(String),

    /// A reserved-namespace path had too few segments after its marker.
    #[error("malformed special path: {0:?}")]
    MalformedSpecialPath(String),

    /// The reserved-namespace folder is not in the rule table. Indicates
    /// a deployment mismatch, not an access decision.
    #[error("unknown special folder: {0:?}")]
    UnknownNamespace(String),

    /// The HTTP method has no row in the method table. Indicates a
    /// deployment mismatch, not an access decision.
    #[error("no access mapping for method {0}")]
    UnknownMethod(String),

    /// The remote authority could not answer.
    #[error("remote authority unavailable: {0}")]
    Remote(#[from] AuthorityError),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
