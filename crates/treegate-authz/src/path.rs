//! Request-path parsing: repository-name extraction and the `!svn`
//! internal-namespace rules.
//!
//! mod_dav_svn serves version metadata under a reserved `!svn` subtree
//! whose folders do not map 1:1 onto real repository paths. The table
//! below drives how much of such a URI is bookkeeping and whether a real
//! repository path follows it.

use crate::error::{AuthzError, Result};

/// Marker segment that introduces the internal namespace.
const SPECIAL_MARKER: &str = "!svn";

/// Reserved `!svn` sub-folders: (name, minimum trailing segments, whether
/// a real repository path follows those segments).
const SPECIAL_DIRS: &[(&str, usize, bool)] = &[
    ("ver", 1, true),
    ("his", 0, false),
    ("wrk", 1, true),
    ("act", 1, false),
    ("vcc", 1, false),
    ("bc", 1, true),
    ("bln", 1, false),
    ("wbl", 2, false),
];

/// A request path split into its repository and in-repository parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Repository name: the first segment after the root prefix.
    pub repo_name: String,
    /// Relative in-repository path without a leading slash. `Some("")`
    /// is the repository root; `None` means the request does not address
    /// a real path at all (pure bookkeeping URIs).
    pub relative_path: Option<String>,
    /// Which reserved folder the URI went through, if any.
    pub special_folder: Option<String>,
}

/// Splits raw request paths into (repository, relative path).
#[derive(Debug, Clone)]
pub struct PathResolver {
    root_prefix: String,
}

impl PathResolver {
    /// Create a resolver for the given URI root prefix (e.g. `/svn`).
    pub fn new(root_prefix: impl Into<String>) -> Self {
        let mut root_prefix = root_prefix.into();
        while root_prefix.ends_with('/') {
            root_prefix.pop();
        }
        Self { root_prefix }
    }

    /// Parse a raw request path.
    ///
    /// Callers must treat any error as "cannot authorize" (deny plus an
    /// error signal), never as an allow.
    pub fn parse(&self, raw: &str) -> Result<ParsedPath> {
        // Collapse duplicate separators and strip a single trailing one.
        let mut uri = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch == '/' && uri.ends_with('/') {
                continue;
            }
            uri.push(ch);
        }
        if uri.len() > 1 && uri.ends_with('/') {
            uri.pop();
        }

        // The prefix must end on a segment boundary: "/svnfoo" is not
        // under "/svn".
        let relative = uri
            .strip_prefix(&self.root_prefix)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| AuthzError::MalformedPath(raw.to_string()))?;
        let relative = relative.strip_prefix('/').unwrap_or(relative);

        let (repo_name, rest) = match relative.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (relative, None),
        };
        if repo_name.is_empty() {
            return Err(AuthzError::MalformedPath(raw.to_string()));
        }
        let repo_name = repo_name.to_string();

        let rest = match rest {
            Some(rest) => rest,
            None => {
                // Bare "/svn/repo" addresses the repository root.
                return Ok(ParsedPath {
                    repo_name,
                    relative_path: Some(String::new()),
                    special_folder: None,
                });
            }
        };

        let after_marker = match after_marker(rest) {
            Some(after) => after,
            None => {
                return Ok(ParsedPath {
                    repo_name,
                    relative_path: Some(rest.to_string()),
                    special_folder: None,
                });
            }
        };

        if after_marker.is_empty() {
            return Err(AuthzError::MalformedSpecialPath(raw.to_string()));
        }

        let mut segments = after_marker.split('/');
        let folder = segments.next().unwrap_or("");
        let trailing: Vec<&str> = segments.collect();

        let (_, min_segments, has_repo_path) = *SPECIAL_DIRS
            .iter()
            .find(|(name, _, _)| *name == folder)
            .ok_or_else(|| AuthzError::UnknownNamespace(folder.to_string()))?;

        if trailing.len() < min_segments {
            return Err(AuthzError::MalformedSpecialPath(raw.to_string()));
        }

        let relative_path = if trailing.len() == min_segments {
            // All segments were bookkeeping; a real path either starts at
            // the repository root or does not exist for this folder.
            if has_repo_path {
                Some(String::new())
            } else {
                None
            }
        } else {
            Some(trailing[min_segments..].join("/"))
        };

        Ok(ParsedPath {
            repo_name,
            relative_path,
            special_folder: Some(folder.to_string()),
        })
    }
}

/// Everything after the `!svn` marker segment, or `None` when the path
/// has no marker. The marker must be a whole segment: `!svnfoo` is an
/// ordinary folder name.
fn after_marker(rest: &str) -> Option<&str> {
    let mut offset = 0;
    for segment in rest.split('/') {
        if segment == SPECIAL_MARKER {
            let after = &rest[offset + segment.len()..];
            return Some(after.strip_prefix('/').unwrap_or(after));
        }
        offset += segment.len() + 1;
    }
    None
}
