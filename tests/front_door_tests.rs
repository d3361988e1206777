use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use outlook_leads::LeadsError;
use outlook_leads::api::{InferenceClient, MailFetcher};
use outlook_leads::db::{KvStorage, NoopLeadStore, TokenStore, connect};
use outlook_leads::outlook_oauth::{AccessToken, AccessTokenSource, OutlookCredentials, TokenManager};
use outlook_leads::router::{LeadsState, leads_router};
use outlook_leads::service::{LeadClassifier, StepPolicy, Workflow, runs_actor};
use outlook_leads::types::inference::{AiResponse, ChatMessage};
use outlook_leads::types::mail::Message;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/consumers/oauth2/v2.0/token";

struct FixedToken;

#[async_trait]
impl AccessTokenSource for FixedToken {
    async fn access_token(&self) -> Result<AccessToken, LeadsError> {
        Ok(AccessToken::bearer("tok"))
    }
}

struct Inbox;

#[async_trait]
impl MailFetcher for Inbox {
    async fn fetch_all(
        &self,
        _token: &AccessToken,
        _since: Option<&str>,
    ) -> Result<Vec<Message>, LeadsError> {
        Ok(vec![Message {
            id: "m1".to_string(),
            subject: Some("Wedding inquiry".to_string()),
            body_preview: "Name: Jane Doe".to_string(),
            received_date_time: Some("2024-05-01T10:00:00Z".to_string()),
            is_read: false,
            from: None,
        }])
    }
}

struct LeadModel;

#[async_trait]
impl InferenceClient for LeadModel {
    async fn run(&self, messages: &[ChatMessage]) -> Result<AiResponse, LeadsError> {
        let response = if messages[1].content.contains("RESPOND WITH ONLY THIS JSON") {
            r#"{"isLead": true, "leadName": "Jane Doe"}"#
        } else {
            "true"
        };
        Ok(AiResponse {
            response: response.to_string(),
        })
    }
}

struct Harness {
    app: Router,
    store: KvStorage,
    server: MockServer,
}

async fn harness(public_url: Option<&str>) -> Harness {
    let server = MockServer::start().await;
    let store = KvStorage::new(connect("sqlite::memory:").await.expect("sqlite"));
    let creds = OutlookCredentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        authorize_url: format!("{}/consumers/oauth2/v2.0/authorize", server.uri()),
        token_url: format!("{}{}", server.uri(), TOKEN_PATH),
    };
    let tokens = Arc::new(TokenManager::new(
        creds,
        reqwest::Client::new(),
        Arc::new(store.clone()),
    ));

    let workflow = Workflow::new(
        Arc::new(FixedToken),
        Arc::new(Inbox),
        LeadClassifier::new(Arc::new(LeadModel), StepPolicy::no_retry()),
        Arc::new(NoopLeadStore),
        StepPolicy::no_retry(),
    );
    let runs = runs_actor::spawn(Arc::new(workflow), 16)
        .await
        .expect("spawn runs actor");

    let public_url = public_url.map(|u| Url::parse(u).expect("valid url"));
    let app = leads_router(LeadsState::new(runs, tokens, public_url));
    Harness {
        app,
        store,
        server,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "leads.test")
        .body(Body::empty())
        .expect("failed to build request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_str(&body).expect("json body"))
}

#[tokio::test]
async fn auth_redirects_to_consent_with_callback_on_request_host() {
    let h = harness(None).await;
    let resp = h.app.clone().oneshot(get("/auth")).await.expect("request failed");

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers()[header::LOCATION]
        .to_str()
        .expect("ascii location");
    assert!(location.contains("/consumers/oauth2/v2.0/authorize?"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=client-id"));
    assert!(location.contains("scope=offline_access+Mail.Read"));
    assert!(location.contains("redirect_uri=http%3A%2F%2Fleads.test%2Fauth%2Fcallback"));
}

#[tokio::test]
async fn auth_prefers_configured_public_url() {
    let h = harness(Some("https://leads.example.com/")).await;
    let resp = h.app.clone().oneshot(get("/auth")).await.expect("request failed");

    let location = resp.headers()[header::LOCATION]
        .to_str()
        .expect("ascii location");
    assert!(location.contains("redirect_uri=https%3A%2F%2Fleads.example.com%2Fauth%2Fcallback"));
}

#[tokio::test]
async fn callback_without_code_is_bad_request() {
    let h = harness(None).await;

    let (status, body) = send_json(&h.app, get("/auth/callback")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing required parameter: code");

    let (status, _) = send(&h.app, get("/auth/callback?code=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_stores_refresh_token() {
    let h = harness(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3600,
            "access_token": "access",
            "refresh_token": "first-refresh"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let (status, body) = send(&h.app, get("/auth/callback?code=abc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Authentication successful! You can now close this window.");
    assert_eq!(
        h.store.get_refresh_token().await.unwrap().as_deref(),
        Some("first-refresh")
    );
}

#[tokio::test]
async fn callback_token_failure_is_bad_gateway() {
    let h = harness(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS54005: code already redeemed"
        })))
        .mount(&h.server)
        .await;

    let (status, body) = send(&h.app, get("/auth/callback?code=used")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("invalid_grant"));
    assert_eq!(h.store.get_refresh_token().await.unwrap(), None);
}

#[tokio::test]
async fn request_without_email_or_instance_is_bad_request() {
    let h = harness(None).await;

    for uri in ["/", "/anything", "/?email="] {
        let (status, body) = send_json(&h.app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["message"], "Missing required parameter: email");
    }
}

#[tokio::test]
async fn non_get_is_bad_request_on_every_path() {
    let h = harness(None).await;

    for (verb, uri) in [
        ("POST", "/?email=owner@x.com"),
        ("POST", "/auth"),
        ("POST", "/auth/callback?code=x"),
        ("PUT", "/auth"),
        ("DELETE", "/auth/callback"),
    ] {
        let req = Request::builder()
            .method(verb)
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");

        let (status, body) = send_json(&h.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{verb} {uri}");
        assert_eq!(body["error"]["message"], "Unsupported request", "{verb} {uri}");
    }
}

#[tokio::test]
async fn created_run_can_be_looked_up_until_complete() {
    let h = harness(None).await;

    let (status, created) = send_json(
        &h.app,
        get("/?email=owner%40x.com&since=2024-05-01T09%3A44%3A00.000Z"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["details"]["status"], "queued");
    let id = created["id"].as_str().expect("run id").to_string();

    let mut last = Value::Null;
    for _ in 0..200 {
        let (status, body) = send_json(&h.app, get(&format!("/?instanceId={id}"))).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"]["status"] == "complete" {
            last = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let messages = &last["status"]["output"]["messages"];
    assert_eq!(messages[0]["id"], "m1");
    assert_eq!(messages[0]["leadInfo"]["isLead"], true);
    assert_eq!(messages[0]["leadInfo"]["leadName"], "Jane Doe");
}

#[tokio::test]
async fn unknown_instance_is_not_found() {
    let h = harness(None).await;

    let (status, _) = send(
        &h.app,
        get("/?instanceId=0b6f3a8e-3c1e-4a51-9d7e-2f1b8f1c0a11"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&h.app, get("/?instanceId=not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
