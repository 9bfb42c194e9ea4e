//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use wirecloud_upload::api::{ApiRequest, ApiResponse, MarketplaceClient, Transport};
use wirecloud_upload::auth::{BrowserDriver, FixedClock, TokenAcquirer, TokenRecord};
use wirecloud_upload::config::{InstanceRecord, MemoryCredentialStore};
use wirecloud_upload::error::{Error, Result};
use wirecloud_upload::ui::{Prompter, UserCredentials};

pub const INSTANCE: &str = "lab";
pub const URL: &str = "https://wc.example.com";
pub const PASSWORD_CAPABILITIES: &str =
    r#"{"flows":["Resource Owner Password Credentials Grant"]}"#;

/// Answers requests from a queue and remembers every request it saw.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(Error::Transport(format!("no scripted response for {}", url))))
    }
}

/// Prompter with canned answers.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub new_instance: Option<InstanceRecord>,
    pub credentials: Option<UserCredentials>,
    pub confirm_answer: bool,
    credential_prompts: Mutex<usize>,
}

impl ScriptedPrompter {
    pub fn with_credentials(username: &str, password: &str) -> Self {
        Self {
            credentials: Some(UserCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn credential_prompts(&self) -> usize {
        *self.credential_prompts.lock().unwrap()
    }
}

impl Prompter for ScriptedPrompter {
    fn create_instance(&self, _instance_name: &str) -> Result<Option<InstanceRecord>> {
        Ok(self.new_instance.clone())
    }

    fn user_credentials(&self) -> Result<UserCredentials> {
        *self.credential_prompts.lock().unwrap() += 1;
        self.credentials
            .clone()
            .ok_or_else(|| Error::validation("no credentials scripted"))
    }

    fn confirm(&self, _message: &str, _default_yes: bool) -> Result<bool> {
        Ok(self.confirm_answer)
    }
}

/// Browser that lands on a fixed URL, or never finishes when `None`.
pub struct FakeBrowser {
    final_url: Option<String>,
    visited: Mutex<Vec<(String, String)>>,
}

impl FakeBrowser {
    pub fn landing_on(url: &str) -> Self {
        Self {
            final_url: Some(url.to_string()),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            final_url: None,
            visited: Mutex::new(Vec::new()),
        }
    }

    /// `(auth_url, redirect_uri)` pairs the browser was sent to.
    pub fn visited(&self) -> Vec<(String, String)> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn drive_authorization(
        &self,
        auth_url: &str,
        redirect_uri: &str,
        _timeout: Duration,
    ) -> Result<String> {
        self.visited
            .lock()
            .unwrap()
            .push((auth_url.to_string(), redirect_uri.to_string()));
        self.final_url.clone().ok_or(Error::AuthorizationTimedOut)
    }
}

pub fn instance(token: Option<TokenRecord>) -> InstanceRecord {
    InstanceRecord {
        token,
        ..InstanceRecord::new(URL.to_string(), "client".to_string(), "secret".to_string())
    }
}

pub fn token(access_token: &str, refresh_token: Option<&str>, expires_on: i64) -> TokenRecord {
    TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_in: Some(3600),
        expires_on: Some(expires_on),
    }
}

/// Everything a test needs to drive an acquirer or a client.
pub struct Harness {
    pub store: Arc<MemoryCredentialStore>,
    pub transport: Arc<ScriptedTransport>,
    pub prompter: Arc<ScriptedPrompter>,
    pub browser: Arc<FakeBrowser>,
    pub now_ms: i64,
}

impl Harness {
    pub fn new(store: MemoryCredentialStore, transport: ScriptedTransport) -> Self {
        Self {
            store: Arc::new(store),
            transport: Arc::new(transport),
            prompter: Arc::new(ScriptedPrompter::with_credentials("user", "pass")),
            browser: Arc::new(FakeBrowser::landing_on("https://app.example.com/cb?code=abc")),
            now_ms: 200_000,
        }
    }

    /// Instance `lab` holding a token that is valid at `now_ms`.
    pub fn authenticated(transport: ScriptedTransport) -> Self {
        let store = MemoryCredentialStore::with_instance(
            INSTANCE,
            instance(Some(token("cached", Some("refresh"), 10_000_000))),
        );
        Self::new(store, transport)
    }

    pub fn with_prompter(mut self, prompter: ScriptedPrompter) -> Self {
        self.prompter = Arc::new(prompter);
        self
    }

    pub fn with_browser(mut self, browser: FakeBrowser) -> Self {
        self.browser = Arc::new(browser);
        self
    }

    pub fn acquirer(&self) -> TokenAcquirer {
        TokenAcquirer::new(self.store.clone(), self.transport.clone(), self.prompter.clone())
            .with_browser(self.browser.clone())
            .with_clock(Arc::new(FixedClock(self.now_ms)))
    }

    pub fn client(&self) -> MarketplaceClient {
        MarketplaceClient::new(Arc::new(self.acquirer()), self.transport.clone())
    }

    pub fn stored_token(&self) -> Option<TokenRecord> {
        self.store
            .snapshot()
            .get(INSTANCE)
            .and_then(|i| i.token.clone())
    }
}

/// Writes a zipped package with the given `config.xml` into a fresh
/// temporary directory.
pub fn package(config_xml: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("component.wgt");

    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("config.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(config_xml.as_bytes()).unwrap();
    zip.start_file("index.html", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<html></html>").unwrap();
    zip.finish().unwrap();

    (dir, path)
}

pub fn widget_xml(vendor: &str, name: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<widget xmlns="http://wirecloud.conwet.fi.upm.es/ns/macdescription/1" vendor="{}" name="{}" version="{}">
  <details><title>Test</title></details>
</widget>"#,
        vendor, name, version
    )
}
