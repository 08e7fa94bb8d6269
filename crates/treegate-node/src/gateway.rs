//! The authorization gateway: maps WebDAV requests onto engine queries.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use treegate_authz::{
    AccessEngine, AuthzError, ChangedPathsProvider, MethodTable, PathResolver, RemoteAuthority,
};
use treegate_types::{AccessDecision, AccessQuery};

/// Reserved folder whose PROPPATCH requests are revision-property
/// changes rather than ordinary path writes.
const BASELINE_FOLDER: &str = "bln";

/// Shared state for the gateway handlers.
pub struct Gateway<A, C> {
    engine: AccessEngine<A>,
    changed_paths: C,
    resolver: PathResolver,
    methods: MethodTable,
    system_id: String,
    principal_header: String,
}

impl<A: RemoteAuthority, C: ChangedPathsProvider> Gateway<A, C> {
    /// Create a gateway.
    pub fn new(
        engine: AccessEngine<A>,
        changed_paths: C,
        resolver: PathResolver,
        methods: MethodTable,
        system_id: impl Into<String>,
        principal_header: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            changed_paths,
            resolver,
            methods,
            system_id: system_id.into(),
            principal_header: principal_header.into().to_ascii_lowercase(),
        }
    }

    /// Authorize one request.
    ///
    /// An error means "could not decide" and maps to a 5xx, never an
    /// allow.
    pub async fn check(
        &self,
        method: &str,
        uri_path: &str,
        principal: &str,
        destination: Option<&str>,
    ) -> Result<AccessDecision, AuthzError> {
        let rule = self.methods.rule(method)?;
        if rule.always_allow {
            return Ok(AccessDecision::allow(None));
        }

        let parsed = self.resolver.parse(uri_path)?;

        // Revision-property changes are authorized against every path
        // the revision touched, not against the baseline URI itself.
        if method == "PROPPATCH" && parsed.special_folder.as_deref() == Some(BASELINE_FOLDER) {
            return self
                .check_revprop_change(principal, &parsed.repo_name, uri_path)
                .await;
        }

        // mod_dav_svn authorizes MERGE against the repository as a whole.
        let relative_path = if method == "MERGE" {
            None
        } else {
            parsed.relative_path
        };

        let query = AccessQuery::new(&parsed.repo_name, relative_path, rule.level, rule.modifier);
        let decision = self.engine.resolve(principal, &self.system_id, &query).await?;
        if !decision.granted {
            return Ok(decision);
        }

        // COPY/MOVE destinations need recursive commit access on top of
        // the source check that just passed.
        if matches!(method, "COPY" | "MOVE") {
            let destination = destination.ok_or_else(|| {
                AuthzError::MalformedPath(format!("{method} request without a Destination header"))
            })?;
            let dest = self.resolver.parse(&destination_path(destination)?)?;
            let rule = MethodTable::destination_rule();
            let query = AccessQuery::new(&dest.repo_name, dest.relative_path, rule.level, rule.modifier);
            return self.engine.resolve(principal, &self.system_id, &query).await;
        }

        Ok(decision)
    }

    /// Require commit access, recursively, on every path changed by the
    /// revision named in the baseline URI. A revision that yields no
    /// authorizable paths stays denied.
    async fn check_revprop_change(
        &self,
        principal: &str,
        repo_name: &str,
        uri_path: &str,
    ) -> Result<AccessDecision, AuthzError> {
        let revision = uri_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .and_then(|segment| segment.parse::<u64>().ok())
            .ok_or_else(|| {
                AuthzError::MalformedPath(format!("{uri_path} does not end in a revision number"))
            })?;

        let changed = self.changed_paths.changed_paths(repo_name, revision).await?;

        let mut decision = AccessDecision::deny(None);
        for path in changed {
            let rule = MethodTable::destination_rule();
            let query = AccessQuery::new(repo_name, Some(path), rule.level, rule.modifier);
            decision = self.engine.resolve(principal, &self.system_id, &query).await?;
            if !decision.granted {
                return Ok(decision);
            }
        }
        Ok(decision)
    }

    fn principal_header(&self) -> &str {
        &self.principal_header
    }
}

/// Build the gateway router: every method and path funnels into the
/// single authorization handler.
pub fn router<A, C>(gateway: Arc<Gateway<A, C>>) -> Router
where
    A: RemoteAuthority + 'static,
    C: ChangedPathsProvider + 'static,
{
    Router::new()
        .fallback(authorize::<A, C>)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn authorize<A, C>(
    State(gateway): State<Arc<Gateway<A, C>>>,
    request: Request<Body>,
) -> Response
where
    A: RemoteAuthority + 'static,
    C: ChangedPathsProvider + 'static,
{
    let method = request.method().as_str().to_string();
    let uri_path = request.uri().path().to_string();

    let principal = match request
        .headers()
        .get(gateway.principal_header())
        .and_then(|value| value.to_str().ok())
    {
        Some(principal) if !principal.is_empty() => principal.to_string(),
        _ => {
            warn!(%method, path = %uri_path, "request without an authenticated principal");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    let destination = request
        .headers()
        .get("destination")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match gateway
        .check(&method, &uri_path, &principal, destination.as_deref())
        .await
    {
        Ok(decision) if decision.granted => StatusCode::NO_CONTENT.into_response(),
        Ok(decision) => {
            info!(
                %principal,
                %method,
                path = %uri_path,
                anchor = ?decision.anchor,
                "access denied"
            );
            StatusCode::FORBIDDEN.into_response()
        }
        Err(err @ (AuthzError::UnknownMethod(_) | AuthzError::UnknownNamespace(_))) => {
            // Deployment mismatch, not an access decision: log it apart
            // from ordinary denials.
            error!(%err, %method, path = %uri_path, "configuration mismatch");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => {
            error!(%err, %principal, %method, path = %uri_path, "could not authorize request");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Extract the decoded path from a `Destination` header value, which is
/// normally an absolute URL but may arrive as a bare path.
fn destination_path(destination: &str) -> Result<String, AuthzError> {
    let encoded = match url::Url::parse(destination) {
        Ok(url) => url.path().to_string(),
        Err(_) if destination.starts_with('/') => destination.to_string(),
        Err(_) => return Err(AuthzError::MalformedPath(destination.to_string())),
    };
    percent_decode_str(&encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AuthzError::MalformedPath(destination.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_path_from_url() {
        assert_eq!(
            destination_path("http://host:8080/svn/proj/branches/a%20b").unwrap(),
            "/svn/proj/branches/a b",
        );
        assert_eq!(
            destination_path("/svn/proj/branches/x").unwrap(),
            "/svn/proj/branches/x",
        );
        assert!(destination_path("not a url").is_err());
    }
}
