//! Concrete collaborators for the Treegate engine.
//!
//! - [`HttpAuthority`]: the remote permission authority reached over its
//!   HTTP permission-proxy endpoint
//! - [`SvnlookChangedPaths`]: lists a revision's changed paths by
//!   shelling out to `svnlook`

mod http;
mod svnlook;

pub use http::HttpAuthority;
pub use svnlook::SvnlookChangedPaths;
