//! End-to-end tests for the authorization gateway: full requests through
//! the router against a canned authority.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;
use treegate_authz::{
    AccessEngine, AuthorityError, CacheStore, ChangedPathsProvider, GlobalAccess, MethodTable,
    PathResolver, RemoteAuthority,
};
use treegate_node::gateway::{router, Gateway};
use treegate_types::AccessLevel;

struct StaticAuthority {
    grants: Vec<String>,
}

#[async_trait]
impl RemoteAuthority for StaticAuthority {
    async fn fetch_grants(
        &self,
        _principal: &str,
        _system_id: &str,
        _repo_name: &str,
    ) -> Result<Vec<String>, AuthorityError> {
        Ok(self.grants.clone())
    }

    async fn fetch_global_access(
        &self,
        _principal: &str,
        _system_id: &str,
        _repo_name: &str,
        _level: AccessLevel,
    ) -> Result<GlobalAccess, AuthorityError> {
        Ok(GlobalAccess {
            at_path: false,
            all_descendants: false,
            any_descendant: false,
        })
    }
}

struct StaticChangedPaths {
    paths: Vec<String>,
}

#[async_trait]
impl ChangedPathsProvider for StaticChangedPaths {
    async fn changed_paths(
        &self,
        _repo_name: &str,
        _revision: u64,
    ) -> Result<Vec<String>, AuthorityError> {
        Ok(self.paths.clone())
    }
}

fn test_app(grants: &[&str], changed: &[&str]) -> Router {
    let authority = StaticAuthority {
        grants: grants.iter().map(|g| g.to_string()).collect(),
    };
    let engine = AccessEngine::new(Arc::new(CacheStore::with_defaults()), authority);
    let gateway = Gateway::new(
        engine,
        StaticChangedPaths {
            paths: changed.iter().map(|p| p.to_string()).collect(),
        },
        PathResolver::new("/svn"),
        MethodTable::default(),
        "exsy1001",
        "x-forwarded-user",
    );
    router(Arc::new(gateway))
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-user", "alice")
        .body(Body::empty())
        .unwrap()
}

async fn status_of(app: Router, request: Request<Body>) -> StatusCode {
    app.oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_get_allowed_by_ancestor_grant() {
    let app = test_app(&["view:/proj"], &[]);
    let status = status_of(app, request("GET", "/svn/proj/trunk/file.txt")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_put_denied_on_view_only_grant() {
    let app = test_app(&["view:/proj"], &[]);
    let status = status_of(app, request("PUT", "/svn/proj/trunk/file.txt")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_principal_is_denied() {
    let app = test_app(&["commit:/proj"], &[]);
    let req = Request::builder()
        .method("GET")
        .uri("/svn/proj/trunk")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app, req).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_options_always_allowed() {
    let app = test_app(&[], &[]);
    let status = status_of(app, request("OPTIONS", "/svn/proj")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_method_is_server_error() {
    let app = test_app(&["commit:/proj"], &[]);
    let status = status_of(app, request("BREW", "/svn/proj/trunk")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_special_folder_is_server_error() {
    let app = test_app(&["commit:/proj"], &[]);
    let status = status_of(app, request("GET", "/svn/proj/!svn/xyz/1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_delete_revoked_by_weak_descendant() {
    let app = test_app(&["commit:/proj/trunk", "view:/proj/trunk/docs"], &[]);
    let status = status_of(app, request("DELETE", "/svn/proj/trunk")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_copy_denied_on_readonly_destination() {
    let app = test_app(&["commit:/proj/trunk", "view:/proj/branches"], &[]);
    let req = Request::builder()
        .method("COPY")
        .uri("/svn/proj/trunk")
        .header("x-forwarded-user", "alice")
        .header("destination", "http://host/svn/proj/branches/copy")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app, req).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_copy_allowed_with_writable_destination() {
    let app = test_app(&["commit:/proj"], &[]);
    let req = Request::builder()
        .method("COPY")
        .uri("/svn/proj/trunk")
        .header("x-forwarded-user", "alice")
        .header("destination", "http://host/svn/proj/branches/copy")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(app, req).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_copy_without_destination_is_server_error() {
    let app = test_app(&["commit:/proj"], &[]);
    let status = status_of(app, request("COPY", "/svn/proj/trunk")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_merge_authorizes_repository_root() {
    // MERGE ignores its URI path; commit access anywhere in the repository
    // satisfies the root-level existence check.
    let app = test_app(&["commit:/proj/trunk"], &[]);
    let status = status_of(app, request("MERGE", "/svn/proj/!svn/act/abc123")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_revprop_change_requires_commit_on_every_changed_path() {
    let app = test_app(
        &["commit:/proj/trunk", "view:/proj/branches"],
        &["trunk/a.txt", "branches/b.txt"],
    );
    let status = status_of(app, request("PROPPATCH", "/svn/proj/!svn/bln/42")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revprop_change_allowed_when_all_paths_writable() {
    let app = test_app(&["commit:/proj"], &["trunk/a.txt", "trunk/b.txt"]);
    let status = status_of(app, request("PROPPATCH", "/svn/proj/!svn/bln/42")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_revprop_change_with_no_changed_paths_is_denied() {
    let app = test_app(&["commit:/proj"], &[]);
    let status = status_of(app, request("PROPPATCH", "/svn/proj/!svn/bln/42")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revprop_change_with_bad_revision_is_server_error() {
    let app = test_app(&["commit:/proj"], &[]);
    let status = status_of(app, request("PROPPATCH", "/svn/proj/!svn/bln/latest")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_ordinary_proppatch_uses_the_uri_path() {
    // PROPPATCH outside the baseline folder is a plain commit check.
    let app = test_app(&["commit:/proj/trunk"], &[]);
    let ok = status_of(
        test_app(&["commit:/proj/trunk"], &[]),
        request("PROPPATCH", "/svn/proj/trunk/file.txt"),
    )
    .await;
    assert_eq!(ok, StatusCode::NO_CONTENT);

    let denied = status_of(app, request("PROPPATCH", "/svn/proj/branches/x")).await;
    assert_eq!(denied, StatusCode::FORBIDDEN);
}
