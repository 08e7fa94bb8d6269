//! Changed-path listing via `svnlook`, used to authorize
//! revision-property changes against every path a revision touched.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;
use treegate_authz::{AuthorityError, ChangedPathsProvider};

/// Lists a revision's changed paths by running `svnlook changed`.
pub struct SvnlookChangedPaths {
    /// Directory containing the repositories, one per repository name.
    repository_root: PathBuf,
    /// The `svnlook` binary to invoke.
    binary: PathBuf,
}

impl SvnlookChangedPaths {
    /// Create a provider over the given on-disk repository root.
    pub fn new(repository_root: impl Into<PathBuf>) -> Self {
        Self {
            repository_root: repository_root.into(),
            binary: PathBuf::from("svnlook"),
        }
    }

    /// Use a specific `svnlook` binary instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Strip the change-code columns from one `svnlook changed` line.
    ///
    /// Lines look like `U   trunk/src/main.rs` or `_U  trunk/` - two
    /// status columns, whitespace, then the path (directories carry a
    /// trailing slash). A line too short to carry both columns, or one
    /// whose columns are not ASCII, is noise and skipped.
    fn parse_line(line: &str) -> Option<String> {
        let rest = line.get(2..)?;
        let path = rest.trim().trim_end_matches('/');
        if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        }
    }
}

#[async_trait]
impl ChangedPathsProvider for SvnlookChangedPaths {
    async fn changed_paths(
        &self,
        repo_name: &str,
        revision: u64,
    ) -> Result<Vec<String>, AuthorityError> {
        let repository = self.repository_root.join(repo_name);
        let output = Command::new(&self.binary)
            .arg("changed")
            .arg(&repository)
            .arg("-r")
            .arg(revision.to_string())
            .output()
            .await
            .map_err(|e| AuthorityError::Transport(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthorityError::Transport(format!(
                "svnlook changed failed for {repo_name}@{revision}: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| AuthorityError::MalformedResponse(e.to_string()))?;
        let paths: Vec<String> = stdout.lines().filter_map(Self::parse_line).collect();
        debug!(repo = repo_name, revision, count = paths.len(), "listed changed paths");
        Ok(paths)
    }
}
