//! Trusted Host Module Tests
//!
//! ## Test Scopes
//! - **Envelope validation**: missing keys and unknown modes are 400s.
//! - **Authentication**: missing or wrong credentials are 401s, and the envelope is checked first.
//! - **Forwarding**: accepted requests reach the proxy manager with a normalized mode and no credentials.

#[cfg(test)]
mod tests {
    use crate::config::Credentials;
    use crate::error::GatewayError;
    use crate::membership::loader::MembershipFile;
    use crate::membership::types::RoleTag;
    use crate::relay::client::RelayClient;
    use crate::relay::protocol::{Mode, ProcessRequest};
    use crate::testing::*;
    use crate::trusted_host::auth::{authenticate, validate_envelope};
    use crate::trusted_host::handlers::{TrustedHostState, router};
    use axum::body::Body;
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn trusted_host(proxy_manager_file: PathBuf) -> axum::Router {
        router(Arc::new(TrustedHostState {
            proxy_managers: MembershipFile::new(proxy_manager_file),
            credentials: Credentials::new("admin", "secret"),
            relay: RelayClient::new(Duration::from_secs(5)).unwrap(),
            node_port: 80,
        }))
    }

    fn request(body: &str, username: Option<&str>, password: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/process").header("content-type", "application/json");
        if let Some(username) = username {
            builder = builder.header("username", username);
        }
        if let Some(password) = password {
            builder = builder.header("password", password);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn with_stub_proxy(reply: Value) -> (tempfile::TempDir, PathBuf, SocketAddr, StubUpstream) {
        let dir = tempfile::tempdir().unwrap();
        let (addr, stub) = stub_upstream("/process", StatusCode::OK, reply).await;
        let file = write_descriptors(
            dir.path(),
            "proxy_info.json",
            &[descriptor(RoleTag::ProxyManager, "pm", addr)],
        );
        (dir, file, addr, stub)
    }

    // ============================================================
    // ENVELOPE TESTS
    // ============================================================

    #[test]
    fn test_validate_envelope_normalizes_mode() {
        let request = ProcessRequest {
            query: Some("SELECT 1".into()),
            mode: Some("customized".into()),
        };

        let (query, mode) = validate_envelope(&request).unwrap();

        assert_eq!(query, "SELECT 1");
        assert_eq!(mode, Mode::Customized);
    }

    #[test]
    fn test_validate_envelope_missing_fields() {
        for request in [
            ProcessRequest::default(),
            ProcessRequest {
                query: Some("SELECT 1".into()),
                mode: None,
            },
            ProcessRequest {
                query: None,
                mode: Some("DIRECT".into()),
            },
        ] {
            let err = validate_envelope(&request).unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
    }

    #[test]
    fn test_validate_envelope_unknown_mode() {
        let request = ProcessRequest {
            query: Some("SELECT 1".into()),
            mode: Some("FASTEST".into()),
        };

        let err = validate_envelope(&request).unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(err.to_string().contains("Allowed modes are"));
    }

    // ============================================================
    // AUTHENTICATION TESTS
    // ============================================================

    #[test]
    fn test_authenticate() {
        let credentials = Credentials::new("admin", "secret");
        let mut headers = HeaderMap::new();

        let err = authenticate(&headers, &credentials).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'username' or 'password' in headers.");

        headers.insert("username", HeaderValue::from_static("admin"));
        headers.insert("password", HeaderValue::from_static("wrong"));
        let err = authenticate(&headers, &credentials).unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password.");

        headers.insert("password", HeaderValue::from_static("secret"));
        assert!(authenticate(&headers, &credentials).is_ok());
    }

    // ============================================================
    // HANDLER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_missing_mode_is_400() {
        let (_dir, file, _addr, stub) = with_stub_proxy(json!({})).await;

        let response = trusted_host(file)
            .oneshot(request(r#"{"query": "SELECT 1"}"#, Some("admin"), Some("secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing required keys. Required keys: 'query', 'mode'"
        );
        assert_eq!(stub.hits(), 0);
    }

    #[tokio::test]
    async fn test_unknown_mode_is_400_even_without_credentials() {
        let (_dir, file, _addr, stub) = with_stub_proxy(json!({})).await;

        let response = trusted_host(file)
            .oneshot(request(r#"{"query": "SELECT 1", "mode": "LOCAL"}"#, None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stub.hits(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (_dir, file, _addr, _stub) = with_stub_proxy(json!({})).await;

        let response = trusted_host(file)
            .oneshot(request("{", Some("admin"), Some("secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_credentials_are_401_with_valid_body() {
        let (_dir, file, _addr, stub) = with_stub_proxy(json!({})).await;
        let app = trusted_host(file);

        for (username, password) in [
            (Some("admin"), Some("wrong")),
            (Some("root"), Some("secret")),
            (Some("admin"), None),
            (None, None),
        ] {
            let response = app
                .clone()
                .oneshot(request(
                    r#"{"query": "SELECT 1", "mode": "DIRECT"}"#,
                    username,
                    password,
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(stub.hits(), 0);
    }

    #[tokio::test]
    async fn test_forwards_normalized_mode_without_credentials() {
        let reply = json!({"rows": [{"n": 1}]});
        let (_dir, file, _addr, stub) = with_stub_proxy(reply.clone()).await;

        let response = trusted_host(file)
            .oneshot(request(
                r#"{"query": "SELECT 1 AS n", "mode": "random"}"#,
                Some("admin"),
                Some("secret"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, reply);
        assert_eq!(
            stub.last_body.lock().await.clone().unwrap(),
            json!({"query": "SELECT 1 AS n", "mode": "RANDOM"})
        );

        let headers = stub.last_headers.lock().await.clone();
        assert!(!headers.iter().any(|(name, _)| name == "password"));
    }

    #[tokio::test]
    async fn test_unreachable_proxy_manager() {
        let dir = tempfile::tempdir().unwrap();
        let addr = unreachable_addr().await;
        let file = write_descriptors(
            dir.path(),
            "proxy_info.json",
            &[descriptor(RoleTag::ProxyManager, "pm", addr)],
        );

        let response = trusted_host(file)
            .oneshot(request(
                r#"{"query": "SELECT 1", "mode": "DIRECT"}"#,
                Some("admin"),
                Some("secret"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Query forwarding failed");
    }

    #[tokio::test]
    async fn test_empty_proxy_manager_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_descriptors(dir.path(), "proxy_info.json", &[]);

        let response = trusted_host(file)
            .oneshot(request(
                r#"{"query": "SELECT 1", "mode": "DIRECT"}"#,
                Some("admin"),
                Some("secret"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "no proxy manager found in the configuration"
        );
    }
}
