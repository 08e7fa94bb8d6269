//! Interfaces to the external collaborators: the remote permission
//! authority and the version-control changed-paths lister.

use async_trait::async_trait;
use thiserror::Error;
use treegate_types::AccessLevel;

/// Failure modes of a remote-authority call.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// The request did not complete within the configured timeout.
    #[error("authority request timed out")]
    Timeout,

    /// The request could not be delivered or the authority answered
    /// with a non-success status.
    #[error("authority transport failure: {0}")]
    Transport(String),

    /// The authority answered with something we could not decode.
    #[error("malformed authority response: {0}")]
    MalformedResponse(String),
}

/// Answer to a global-access question about a whole repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalAccess {
    /// Granted at the queried path itself.
    pub at_path: bool,
    /// Granted for the path and every descendant.
    pub all_descendants: bool,
    /// Granted for the path or at least one descendant.
    pub any_descendant: bool,
}

/// Remote source of truth for path-based permissions.
///
/// Implementations must bound every call with a timeout; the engine has
/// no internal retry and propagates failures to the caller, which fails
/// closed.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Fetch the raw `"<level>:<path>"` grant list for a principal.
    async fn fetch_grants(
        &self,
        principal: &str,
        system_id: &str,
        repo_name: &str,
    ) -> std::result::Result<Vec<String>, AuthorityError>;

    /// Ask whether the principal holds `level` over the whole repository.
    async fn fetch_global_access(
        &self,
        principal: &str,
        system_id: &str,
        repo_name: &str,
        level: AccessLevel,
    ) -> std::result::Result<GlobalAccess, AuthorityError>;
}

/// Lists the paths a revision touched, for revision-property checks.
#[async_trait]
pub trait ChangedPathsProvider: Send + Sync {
    /// Every path changed by `revision`, absolute within the repository.
    async fn changed_paths(
        &self,
        repo_name: &str,
        revision: u64,
    ) -> std::result::Result<Vec<String>, AuthorityError>;
}
