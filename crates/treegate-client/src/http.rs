//! HTTP client for the remote permission authority.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use treegate_authz::{AuthorityError, GlobalAccess, RemoteAuthority};
use treegate_types::AccessLevel;

/// Remote permission authority reached over HTTP.
///
/// Every request carries the client-wide timeout, so a struggling
/// authority can never block a request-handling context indefinitely.
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GrantsResponse {
    grants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalAccessResponse {
    at_path: bool,
    all_descendants: bool,
    any_descendant: bool,
}

impl HttpAuthority {
    /// Create a client against `base_url` with a hard per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .user_agent("treegate")
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::Transport(e.to_string()))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AuthorityError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorityError::Transport(format!(
                "{url} returned {status}"
            )));
        }

        response.json().await.map_err(map_reqwest)
    }
}

fn map_reqwest(err: reqwest::Error) -> AuthorityError {
    if err.is_timeout() {
        AuthorityError::Timeout
    } else if err.is_decode() {
        AuthorityError::MalformedResponse(err.to_string())
    } else {
        AuthorityError::Transport(err.to_string())
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_grants(
        &self,
        principal: &str,
        system_id: &str,
        repo_name: &str,
    ) -> Result<Vec<String>, AuthorityError> {
        let response: GrantsResponse = self
            .get_json(
                "/permissions",
                &[
                    ("user", principal),
                    ("system", system_id),
                    ("repo", repo_name),
                ],
            )
            .await?;
        Ok(response.grants)
    }

    async fn fetch_global_access(
        &self,
        principal: &str,
        system_id: &str,
        repo_name: &str,
        level: AccessLevel,
    ) -> Result<GlobalAccess, AuthorityError> {
        let level = level.to_string();
        let response: GlobalAccessResponse = self
            .get_json(
                "/permissions/global",
                &[
                    ("user", principal),
                    ("system", system_id),
                    ("repo", repo_name),
                    ("type", &level),
                ],
            )
            .await?;
        Ok(GlobalAccess {
            at_path: response.at_path,
            all_descendants: response.all_descendants,
            any_descendant: response.any_descendant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_grants() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/permissions"))
            .and(query_param("user", "alice"))
            .and(query_param("system", "exsy1001"))
            .and(query_param("repo", "proj"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "grants": ["commit:/proj/trunk", "view:/proj"],
            })))
            .mount(&server)
            .await;

        let authority = HttpAuthority::new(server.uri(), Duration::from_secs(5)).unwrap();
        let grants = authority
            .fetch_grants("alice", "exsy1001", "proj")
            .await
            .unwrap();
        assert_eq!(grants, vec!["commit:/proj/trunk", "view:/proj"]);
    }

    #[tokio::test]
    async fn test_fetch_global_access() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/permissions/global"))
            .and(query_param("type", "commit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "at_path": true,
                "all_descendants": false,
                "any_descendant": true,
            })))
            .mount(&server)
            .await;

        let authority = HttpAuthority::new(server.uri(), Duration::from_secs(5)).unwrap();
        let access = authority
            .fetch_global_access("alice", "exsy1001", "proj", AccessLevel::Commit)
            .await
            .unwrap();
        assert!(access.at_path);
        assert!(!access.all_descendants);
        assert!(access.any_descendant);
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/permissions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let authority = HttpAuthority::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = authority
            .fetch_grants("alice", "exsy1001", "proj")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorityError::Transport(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/permissions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let authority = HttpAuthority::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = authority
            .fetch_grants("alice", "exsy1001", "proj")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorityError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/permissions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "grants": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let authority = HttpAuthority::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = authority
            .fetch_grants("alice", "exsy1001", "proj")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorityError::Timeout));
    }
}
