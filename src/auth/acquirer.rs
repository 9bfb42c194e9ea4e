//! Token acquisition: reuse, refresh or a full grant, in that order.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::browser::{AUTHORIZATION_TIMEOUT, BrowserDriver, SystemBrowser};
use super::capabilities::{discover, select_flow};
use super::flows::{GrantContext, refresh_grant};
use super::token::{Clock, SystemClock, TokenRecord};
use crate::api::transport::Transport;
use crate::config::{
    ACCESS_TOKEN_ENV, CredentialStore, DEFAULT_INSTANCE_URL, InstanceRecord, URL_ENV,
};
use crate::error::{Error, Result};
use crate::ui::prompts::Prompter;

/// What to do with the token cached on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDecision {
    Reuse,
    Refresh,
    Authenticate,
}

pub fn decide(instance: &InstanceRecord, now_ms: i64) -> TokenDecision {
    match &instance.token {
        Some(token) if !token.access_token.is_empty() => {
            if token.is_valid_at(now_ms) {
                TokenDecision::Reuse
            } else {
                TokenDecision::Refresh
            }
        }
        _ => TokenDecision::Authenticate,
    }
}

/// Bearer token supplied from outside; skips the store and every flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOverride {
    pub access_token: String,
    pub url: String,
}

impl TokenOverride {
    pub fn new(access_token: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            url: url.into(),
        }
    }

    /// Reads `WIRECLOUD_ACCESS_TOKEN` (and optionally `WIRECLOUD_URL`).
    pub fn from_env() -> Option<Self> {
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        let url = std::env::var(URL_ENV).unwrap_or_else(|_| DEFAULT_INSTANCE_URL.to_string());
        Some(Self::new(access_token, url))
    }

    fn instance(&self) -> InstanceRecord {
        InstanceRecord {
            url: self.url.clone(),
            token: Some(TokenRecord {
                access_token: self.access_token.clone(),
                refresh_token: None,
                expires_in: None,
                expires_on: None,
            }),
            ..Default::default()
        }
    }
}

pub struct TokenAcquirer {
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    prompter: Arc<dyn Prompter>,
    browser: Arc<dyn BrowserDriver>,
    clock: Arc<dyn Clock>,
    token_override: Option<TokenOverride>,
    authorization_timeout: Duration,
}

impl TokenAcquirer {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            store,
            transport,
            prompter,
            browser: Arc::new(SystemBrowser),
            clock: Arc::new(SystemClock),
            token_override: None,
            authorization_timeout: AUTHORIZATION_TIMEOUT,
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserDriver>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_override(mut self, token_override: Option<TokenOverride>) -> Self {
        self.token_override = token_override;
        self
    }

    pub fn with_authorization_timeout(mut self, timeout: Duration) -> Self {
        self.authorization_timeout = timeout;
        self
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Returns the instance carrying a token that is valid right now.
    pub async fn acquire(&self, instance_name: &str) -> Result<InstanceRecord> {
        if let Some(token_override) = &self.token_override {
            debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(token_override.instance());
        }

        let credentials = self.store.load()?;
        let instance = match credentials.get(instance_name) {
            Some(instance) => instance.clone(),
            None => self.create_instance(instance_name)?,
        };

        match decide(&instance, self.clock.now_millis()) {
            TokenDecision::Reuse => {
                debug!("Reusing cached token for {}", instance_name);
                Ok(instance)
            }
            TokenDecision::Refresh => {
                info!("Token for {} expired, refreshing", instance_name);
                match refresh_grant(self.transport.as_ref(), self.clock.as_ref(), &instance).await {
                    Ok(token) => self.store_token(instance_name, instance, token),
                    Err(Error::ExpiredRefreshToken) => {
                        warn!("Refresh token for {} rejected, authenticating again", instance_name);
                        self.authenticate(instance_name, instance).await
                    }
                    Err(e) => Err(e),
                }
            }
            TokenDecision::Authenticate => self.authenticate(instance_name, instance).await,
        }
    }

    fn create_instance(&self, instance_name: &str) -> Result<InstanceRecord> {
        let instance = self
            .prompter
            .create_instance(instance_name)?
            .ok_or_else(|| Error::NotConfigured {
                instance: instance_name.to_string(),
            })?;

        let mut credentials = self.store.load()?;
        credentials.insert(instance_name, instance.clone());
        self.store.save(&credentials)?;

        info!("Created instance {}", instance_name);
        Ok(instance)
    }

    async fn authenticate(&self, instance_name: &str, instance: InstanceRecord) -> Result<InstanceRecord> {
        let descriptor = discover(self.transport.as_ref(), &instance.url).await?;
        let flow = select_flow(&descriptor);
        info!("Authenticating against {} using {:?} flow", instance.url, flow);

        let ctx = GrantContext {
            transport: self.transport.as_ref(),
            clock: self.clock.as_ref(),
            prompter: self.prompter.as_ref(),
            browser: self.browser.as_ref(),
            authorization_timeout: self.authorization_timeout,
        };
        let token = flow.execute(&ctx, &descriptor, &instance).await?;

        self.store_token(instance_name, instance, token)
    }

    fn store_token(
        &self,
        instance_name: &str,
        mut instance: InstanceRecord,
        token: TokenRecord,
    ) -> Result<InstanceRecord> {
        instance.token = Some(token);

        let mut credentials = self.store.load()?;
        match credentials.hosts.get_mut(instance_name) {
            Some(stored) => stored.token = instance.token.clone(),
            None => credentials.insert(instance_name, instance.clone()),
        }
        self.store.save(&credentials)?;

        debug!("Stored new token for {}", instance_name);
        Ok(instance)
    }
}
