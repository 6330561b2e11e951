use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use passport_admin::{
    json, AdminClient, AdminError, AdminOp, CallOptions, Config, ErrorBody, Params,
    PrincipalRepresentation, Result, TokenProvider, TokenSet, TokenSource,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Token source for tests: counts calls, optionally fails, optionally slow.
struct TestSource {
    refresh_calls: AtomicUsize,
    login_calls: AtomicUsize,
    refresh_fails: bool,
    login_delay_ms: u64,
}

impl TestSource {
    fn new() -> Self {
        TestSource {
            refresh_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            refresh_fails: false,
            login_delay_ms: 0,
        }
    }

    fn failing_refresh(mut self) -> Self {
        self.refresh_fails = true;
        self
    }

    fn with_login_delay(mut self, ms: u64) -> Self {
        self.login_delay_ms = ms;
        self
    }
}

#[async_trait]
impl TokenSource for TestSource {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fails {
            return Err(AdminError::Auth("session not active".to_string()));
        }
        Ok(TokenSet::new(
            "renewed-token".to_string(),
            Some("next-refresh".to_string()),
            300,
        ))
    }

    async fn login(&self) -> Result<TokenSet> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.login_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.login_delay_ms)).await;
        }
        Ok(TokenSet::new(
            "login-token".to_string(),
            Some("fresh-refresh".to_string()),
            300,
        ))
    }
}

/// Matches a request that does NOT carry the given query parameter.
struct NoQueryParam(&'static str);

impl wiremock::Match for NoQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(k, _)| k == self.0)
    }
}

/// Matches a request that does NOT carry the given header.
struct NoHeader(&'static str);

impl wiremock::Match for NoHeader {
    fn matches(&self, request: &Request) -> bool {
        !request
            .headers
            .iter()
            .any(|(name, _)| name.as_str().eq_ignore_ascii_case(self.0))
    }
}

async fn client_with_token(server: &MockServer, token: &str) -> AdminClient {
    let provider = Arc::new(TokenProvider::new(Arc::new(TestSource::new())));
    provider
        .set_token_set(TokenSet::new(token.to_string(), Some("rt".to_string()), 300))
        .await;
    client_with_provider(server, provider)
}

fn client_with_provider(server: &MockServer, provider: Arc<TokenProvider>) -> AdminClient {
    let config = Config::new(&server.uri(), "test").expect("valid base url");
    AdminClient::new(config, provider).expect("valid registry")
}

fn params(pairs: &[(&str, serde_json::Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn resolves_path_and_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/principals/p-1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "name": "Acme Corp",
            "type": "CORPORATION",
            "active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let principal: PrincipalRepresentation = client
        .apply(
            AdminOp::GetPrincipal,
            &params(&[("id", json!("p-1"))]),
            None,
            CallOptions::default(),
        )
        .await
        .expect("request should succeed");

    assert_eq!(principal.name, "Acme Corp");
    assert_eq!(principal.kind, "CORPORATION");
}

#[tokio::test]
async fn missing_path_parameter_fails_before_any_request() {
    let server = MockServer::start().await;

    let client = client_with_token(&server, "test-token").await;
    let err = client
        .execute(AdminOp::GetPrincipal, &Params::new(), None, CallOptions::default())
        .await
        .expect_err("resolution should fail");

    match err {
        AdminError::MissingPathParameter { name } => assert_eq!(name, "id"),
        other => panic!("expected MissingPathParameter, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn path_parameters_are_escaped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/principals/a b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a b",
            "name": "Spaced",
            "type": "TRUST"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    client
        .execute(
            AdminOp::GetPrincipal,
            &params(&[("id", json!("a b"))]),
            None,
            CallOptions::default(),
        )
        .await
        .expect("request should succeed");

    let received = &server.received_requests().await.unwrap()[0];
    assert_eq!(
        received.url.path(),
        "/admin/realms/test/agency/principals/a%20b"
    );
}

#[tokio::test]
async fn query_allow_list_is_total_and_order_stable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/principals"))
        .and(query_param("first", "0"))
        .and(query_param("max", "10"))
        .and(NoQueryParam("secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    client
        .execute(
            AdminOp::ListPrincipals,
            &params(&[
                ("first", json!(0)),
                ("max", json!(10)),
                ("secret", json!("x")),
            ]),
            None,
            CallOptions::default(),
        )
        .await
        .expect("request should succeed");

    let received = &server.received_requests().await.unwrap()[0];
    assert_eq!(received.url.query(), Some("first=0&max=10"));
}

#[tokio::test]
async fn extra_call_parameters_are_ignored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/principals/p-1"))
        .and(NoQueryParam("junk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "name": "Acme Corp",
            "type": "CORPORATION"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    client
        .execute(
            AdminOp::GetPrincipal,
            &params(&[("id", json!("p-1")), ("junk", json!("dropped"))]),
            None,
            CallOptions::default(),
        )
        .await
        .expect("request should succeed");

    let received = &server.received_requests().await.unwrap()[0];
    assert_eq!(received.url.query(), None);
}

#[tokio::test]
async fn body_is_sent_as_json_with_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/realms/test/agency/principals"))
        .and(header("Content-Type", "application/json"))
        .and(wiremock::matchers::body_json(json!({
            "name": "Acme Corp",
            "type": "corporation"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p-9",
            "name": "Acme Corp",
            "type": "corporation"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let created: PrincipalRepresentation = client
        .apply(
            AdminOp::CreatePrincipal,
            &Params::new(),
            Some(&json!({"name": "Acme Corp", "type": "corporation"})),
            CallOptions::default(),
        )
        .await
        .expect("request should succeed");

    assert_eq!(created.id.as_deref(), Some("p-9"));
}

#[tokio::test]
async fn forbidden_response_classifies_with_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let err = client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect_err("should classify");

    assert!(err.is_permission_denied());
    let network = err.network().expect("network error");
    assert_eq!(network.status, 403);
    assert_eq!(network.message, "forbidden");
}

#[tokio::test]
async fn error_description_is_preferred_for_the_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_request",
            "error_description": "Missing form parameter"
        })))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let err = client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect_err("should classify");

    assert_eq!(err.network().unwrap().message, "Missing form parameter");
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let err = client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect_err("should classify");

    let network = err.network().unwrap();
    assert_eq!(network.status, 502);
    assert_eq!(network.body, ErrorBody::Text("upstream down".to_string()));
    assert_eq!(network.message, "502 Bad Gateway");
}

#[tokio::test]
async fn not_found_is_distinguishable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/principals/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let err = client
        .execute(
            AdminOp::GetPrincipal,
            &params(&[("id", json!("ghost"))]),
            None,
            CallOptions::default(),
        )
        .await
        .expect_err("should classify");

    assert!(err.is_not_found());
    assert!(!err.is_permission_denied());
}

#[tokio::test]
async fn no_content_response_is_an_empty_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/realms/test/agency/principals/p-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let value = client
        .execute(
            AdminOp::DeletePrincipal,
            &params(&[("id", json!("p-1"))]),
            None,
            CallOptions::default(),
        )
        .await
        .expect("delete should succeed");

    assert!(value.is_none());
}

#[tokio::test]
async fn expiring_token_is_refreshed_before_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .and(header("Authorization", "Bearer renewed-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "enabled": true,
            "defaultJurisdiction": "DE",
            "complianceMode": "standard",
            "mandatesRequired": false,
            "defaultMandateValidityDays": 365,
            "qualificationsEnforced": false,
            "auditLevel": "basic",
            "agentPassportsEnabled": false,
            "maxPassportsPerPrincipal": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = Arc::new(TestSource::new());
    let provider = Arc::new(TokenProvider::new(source.clone()));
    provider
        .set_token_set(TokenSet::new(
            "stale-token".to_string(),
            Some("rt".to_string()),
            3,
        ))
        .await;

    let client = client_with_provider(&server, provider);
    client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect("request should succeed");

    assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_token_omits_the_authorization_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .and(NoHeader("authorization"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(TokenProvider::new(Arc::new(TestSource::new())));
    let client = client_with_provider(&server, provider);

    let err = client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect_err("server rejects the unauthenticated request");

    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn concurrent_calls_share_one_login_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .and(header("Authorization", "Bearer login-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "enabled": false,
            "defaultJurisdiction": "",
            "complianceMode": "standard",
            "mandatesRequired": false,
            "defaultMandateValidityDays": 0,
            "qualificationsEnforced": false,
            "auditLevel": "basic",
            "agentPassportsEnabled": false,
            "maxPassportsPerPrincipal": 0
        })))
        .expect(2)
        .mount(&server)
        .await;

    let source = Arc::new(TestSource::new().failing_refresh().with_login_delay(50));
    let provider = Arc::new(TokenProvider::new(source.clone()));
    provider
        .set_token_set(TokenSet::new(
            "expired".to_string(),
            Some("rt".to_string()),
            -1,
        ))
        .await;

    let client = client_with_provider(&server, provider);
    let a = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
                .await
        }
    });
    let b = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
                .await
        }
    });

    a.await.unwrap().expect("first call succeeds");
    b.await.unwrap().expect("second call succeeds");

    assert_eq!(source.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_is_not_a_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    });

    let err = client
        .execute(
            AdminOp::GetAgencyConfig,
            &Params::new(),
            None,
            CallOptions::cancellable(cancel),
        )
        .await
        .expect_err("call should settle as cancelled");

    assert!(err.is_cancelled());
    assert!(err.network().is_none());
}

#[tokio::test]
async fn realm_switch_derives_an_independent_client() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/test/agency/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/realms/tenant-a/agency/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "test-token").await;
    let tenant = client.with_realm("tenant-a");

    client
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect("original realm");
    tenant
        .execute(AdminOp::GetAgencyConfig, &Params::new(), None, CallOptions::default())
        .await
        .expect("derived realm");

    assert_eq!(client.config().realm(), "test");
    assert_eq!(tenant.config().realm(), "tenant-a");
}
