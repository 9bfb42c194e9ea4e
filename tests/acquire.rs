mod common;

use common::*;
use reqwest::Method;
use wirecloud_upload::auth::token::compute_expires_on;
use wirecloud_upload::auth::TokenOverride;
use wirecloud_upload::config::{CredentialFile, MemoryCredentialStore};
use wirecloud_upload::error::Error;

const CODE_CAPABILITIES: &str = r#"{
    "flows": ["Authorization Code Grant"],
    "auth_endpoint": "https://idm.example.com/oauth2/authorize",
    "token_endpoint": "https://idm.example.com/oauth2/token",
    "default_redirect_uri": "https://app.example.com/cb"
}"#;

fn unauthenticated(transport: ScriptedTransport) -> Harness {
    Harness::new(MemoryCredentialStore::with_instance(INSTANCE, instance(None)), transport)
}

fn expired(refresh_token: Option<&str>, transport: ScriptedTransport) -> Harness {
    let store = MemoryCredentialStore::with_instance(
        INSTANCE,
        instance(Some(token("stale", refresh_token, 100_000))),
    );
    Harness::new(store, transport)
}

#[tokio::test]
async fn test_valid_cached_token_is_reused_without_network() {
    let harness = Harness::authenticated(ScriptedTransport::new());

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    assert_eq!(record.access_token(), Some("cached"));
    assert_eq!(harness.transport.request_count(), 0);
    assert_eq!(harness.store.save_count(), 0);
}

#[tokio::test]
async fn test_password_grant_end_to_end() {
    let harness = unauthenticated(
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(200, r#"{"expires_in":100}"#),
    );

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    let token = record.token.unwrap();
    assert_eq!(token.expires_on, Some(280_000));
    assert_eq!(token.expires_on, Some(compute_expires_on(200_000, 100)));
    assert_eq!(harness.stored_token(), Some(token));

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "https://wc.example.com/.well-known/oauth");
    assert_eq!(requests[1].method, Method::POST);
    assert_eq!(requests[1].url, "https://wc.example.com/oauth2/token");
    assert_eq!(
        requests[1].header_value("Authorization"),
        Some("Basic Y2xpZW50OnNlY3JldA==")
    );
    assert_eq!(requests[1].form_value("grant_type"), Some("password"));
    assert_eq!(requests[1].form_value("username"), Some("user"));
    assert_eq!(requests[1].form_value("password"), Some("pass"));
}

#[tokio::test]
async fn test_password_grant_rejects_bad_credentials() {
    let harness = unauthenticated(
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(401, ""),
    );

    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();

    assert!(matches!(err, Error::InvalidCredentials));
    assert_eq!(harness.stored_token(), None);
}

#[tokio::test]
async fn test_password_grant_other_status_is_unexpected() {
    let harness = unauthenticated(
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(503, ""),
    );

    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();
    assert!(err.to_string().contains("Unexpected response"));
}

#[tokio::test]
async fn test_unknown_instance_without_prompting_is_not_configured() {
    let harness = Harness::new(MemoryCredentialStore::default(), ScriptedTransport::new())
        .with_prompter(ScriptedPrompter::default());

    let err = harness.acquirer().acquire("nowhere").await.unwrap_err();

    assert!(matches!(err, Error::NotConfigured { ref instance } if instance == "nowhere"));
    assert_eq!(harness.transport.request_count(), 0);
    assert_eq!(harness.store.save_count(), 0);
}

#[tokio::test]
async fn test_unknown_instance_is_created_then_authenticated() {
    let mut prompter = ScriptedPrompter::with_credentials("user", "pass");
    prompter.new_instance = Some(instance(None));
    let harness = Harness::new(
        MemoryCredentialStore::new(CredentialFile::default()),
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(200, r#"{"access_token":"fresh","expires_in":100}"#),
    )
    .with_prompter(prompter);

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    assert_eq!(record.access_token(), Some("fresh"));
    let stored = harness.store.snapshot();
    assert_eq!(stored.get(INSTANCE).unwrap().client_id, "client");
    assert_eq!(harness.stored_token().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let harness = expired(
        Some("refresh-1"),
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(200, r#"{"access_token":"renewed","expires_in":60}"#),
    );

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    let token = record.token.unwrap();
    assert_eq!(token.access_token, "renewed");
    assert_eq!(token.expires_on, Some(240_000));
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(harness.stored_token(), Some(token));
    assert_eq!(harness.prompter.credential_prompts(), 0);

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].form_value("grant_type"), Some("refresh_token"));
    assert_eq!(requests[1].form_value("refresh_token"), Some("refresh-1"));
    assert_eq!(requests[1].form_value("client_secret"), Some("secret"));
}

#[tokio::test]
async fn test_rejected_refresh_falls_back_to_full_authentication() {
    let harness = expired(
        Some("refresh-1"),
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(401, "")
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(200, r#"{"access_token":"again","refresh_token":"refresh-2","expires_in":100}"#),
    );

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    assert_eq!(record.access_token(), Some("again"));
    assert_eq!(harness.prompter.credential_prompts(), 1);

    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[1].form_value("grant_type"), Some("refresh_token"));
    assert_eq!(requests[3].form_value("grant_type"), Some("password"));
    assert_eq!(
        harness.stored_token().unwrap().refresh_token.as_deref(),
        Some("refresh-2")
    );
}

#[tokio::test]
async fn test_refresh_server_error_is_fatal() {
    let harness = expired(
        Some("refresh-1"),
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(500, ""),
    );

    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();

    assert!(matches!(err, Error::UnexpectedServerResponse(_)));
    assert_eq!(harness.transport.request_count(), 2);
    assert_eq!(harness.prompter.credential_prompts(), 0);
}

#[tokio::test]
async fn test_expired_token_without_refresh_token_authenticates() {
    let harness = expired(
        None,
        ScriptedTransport::new()
            .respond(200, PASSWORD_CAPABILITIES)
            .respond(200, r#"{"access_token":"new","expires_in":100}"#),
    );

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();

    assert_eq!(record.access_token(), Some("new"));
    let requests = harness.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].form_value("grant_type"), Some("password"));
}

#[tokio::test]
async fn test_capability_discovery_failure() {
    let harness = unauthenticated(ScriptedTransport::new().respond(404, "not found"));

    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();
    assert!(matches!(err, Error::CapabilityDiscoveryFailed(_)));

    let harness = unauthenticated(ScriptedTransport::new().fail("connection refused"));
    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();
    assert!(matches!(err, Error::CapabilityDiscoveryFailed(_)));
}

#[tokio::test]
async fn test_authorization_code_flow() {
    let harness = unauthenticated(
        ScriptedTransport::new()
            .respond(200, CODE_CAPABILITIES)
            .respond(200, r#"{"access_token":"coded","expires_in":100}"#),
    );

    let record = harness.acquirer().acquire(INSTANCE).await.unwrap();
    assert_eq!(record.access_token(), Some("coded"));
    assert_eq!(harness.prompter.credential_prompts(), 0);

    let visited = harness.browser.visited();
    assert_eq!(visited.len(), 1);
    let (auth_url, redirect_uri) = &visited[0];
    assert!(auth_url.starts_with("https://idm.example.com/oauth2/authorize?response_type=code"));
    assert!(auth_url.contains("client_id=client"));
    assert!(auth_url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"));
    assert_eq!(redirect_uri, "https://app.example.com/cb");

    let requests = harness.transport.requests();
    assert_eq!(requests[1].url, "https://idm.example.com/oauth2/token");
    assert_eq!(requests[1].form_value("grant_type"), Some("authorization_code"));
    assert_eq!(requests[1].form_value("code"), Some("abc"));
    assert_eq!(
        requests[1].form_value("redirect_uri"),
        Some("https://app.example.com/cb")
    );
}

#[tokio::test]
async fn test_authorization_code_flow_prefers_instance_redirect() {
    let mut record = instance(None);
    record.redirect_uri = Some("http://localhost:8000/done".to_string());
    let harness = Harness::new(
        MemoryCredentialStore::with_instance(INSTANCE, record),
        ScriptedTransport::new()
            .respond(200, CODE_CAPABILITIES)
            .respond(200, r#"{"access_token":"coded","expires_in":100}"#),
    )
    .with_browser(FakeBrowser::landing_on("http://localhost:8000/done?code=xyz"));

    harness.acquirer().acquire(INSTANCE).await.unwrap();

    assert_eq!(harness.browser.visited()[0].1, "http://localhost:8000/done");
    assert_eq!(harness.transport.requests()[1].form_value("code"), Some("xyz"));
}

#[tokio::test]
async fn test_authorization_code_flow_times_out() {
    let harness = unauthenticated(ScriptedTransport::new().respond(200, CODE_CAPABILITIES))
        .with_browser(FakeBrowser::timing_out());

    let err = harness.acquirer().acquire(INSTANCE).await.unwrap_err();

    assert!(matches!(err, Error::AuthorizationTimedOut));
    assert_eq!(harness.transport.request_count(), 1);
    assert_eq!(harness.stored_token(), None);
}

#[tokio::test]
async fn test_override_token_skips_store_and_flows() {
    let harness = Harness::new(MemoryCredentialStore::default(), ScriptedTransport::new());
    let acquirer = harness
        .acquirer()
        .with_override(Some(TokenOverride::new("injected", "https://ci.example.com")));

    let record = acquirer.acquire("anything").await.unwrap();

    assert_eq!(record.access_token(), Some("injected"));
    assert_eq!(record.url, "https://ci.example.com");
    assert_eq!(harness.transport.request_count(), 0);
    assert_eq!(harness.store.save_count(), 0);
}
