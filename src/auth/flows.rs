//! OAuth2 grant exchanges against the token endpoint.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{debug, info};
use reqwest::StatusCode;

use super::browser::{BrowserDriver, extract_code};
use super::capabilities::{CapabilityDescriptor, GrantFlow, discover};
use super::token::{Clock, TokenRecord, TokenResponse};
use crate::api::constants::headers;
use crate::api::transport::{ApiRequest, ApiResponse, Transport};
use crate::config::InstanceRecord;
use crate::error::{Error, Result};
use crate::ui::prompts::Prompter;

/// Collaborators a grant needs besides the instance itself.
pub struct GrantContext<'a> {
    pub transport: &'a dyn Transport,
    pub clock: &'a dyn Clock,
    pub prompter: &'a dyn Prompter,
    pub browser: &'a dyn BrowserDriver,
    pub authorization_timeout: Duration,
}

impl GrantFlow {
    /// Runs the flow from scratch and returns a fresh token.
    pub async fn execute(
        self,
        ctx: &GrantContext<'_>,
        descriptor: &CapabilityDescriptor,
        instance: &InstanceRecord,
    ) -> Result<TokenRecord> {
        match self {
            GrantFlow::Password => password_grant(ctx, descriptor, instance).await,
            GrantFlow::AuthorizationCode => authorization_code_grant(ctx, descriptor, instance).await,
        }
    }
}

fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

fn parse_token(response: &ApiResponse, clock: &dyn Clock) -> Result<TokenRecord> {
    let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
        Error::UnexpectedServerResponse(format!("Invalid token response from server: {}", e))
    })?;
    Ok(TokenRecord::from_response(token, clock.now_millis()))
}

async fn password_grant(
    ctx: &GrantContext<'_>,
    descriptor: &CapabilityDescriptor,
    instance: &InstanceRecord,
) -> Result<TokenRecord> {
    let credentials = ctx.prompter.user_credentials()?;
    let token_endpoint = descriptor.token_endpoint_for(&instance.url);

    info!("Requesting token from {} using the password grant", token_endpoint);
    let request = ApiRequest::post(&token_endpoint)
        .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
        .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_FORM)
        .header(
            headers::AUTHORIZATION,
            basic_auth(&instance.client_id, &instance.client_secret),
        )
        .form(&[
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ]);

    let response = ctx.transport.send(request).await?;
    debug!("Token request status: {}", response.status);

    match response.status {
        StatusCode::OK => parse_token(&response, ctx.clock),
        StatusCode::UNAUTHORIZED => Err(Error::InvalidCredentials),
        status => Err(Error::unexpected_status(status)),
    }
}

async fn authorization_code_grant(
    ctx: &GrantContext<'_>,
    descriptor: &CapabilityDescriptor,
    instance: &InstanceRecord,
) -> Result<TokenRecord> {
    let redirect_uri = instance
        .redirect_uri
        .clone()
        .or_else(|| descriptor.default_redirect_uri.clone())
        .ok_or_else(|| {
            Error::CapabilityDiscoveryFailed("server did not advertise a redirect uri".to_string())
        })?;

    let auth_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}",
        descriptor.auth_endpoint_for(&instance.url),
        urlencoding::encode(&instance.client_id),
        urlencoding::encode(&redirect_uri)
    );
    debug!("Redirect uri: {}", redirect_uri);

    let final_url = ctx
        .browser
        .drive_authorization(&auth_url, &redirect_uri, ctx.authorization_timeout)
        .await?;
    let code = extract_code(&final_url)?;

    let token_endpoint = descriptor.token_endpoint_for(&instance.url);
    info!("Exchanging authorization code at {}", token_endpoint);
    let request = ApiRequest::post(&token_endpoint)
        .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
        .form(&[
            ("code", code.as_str()),
            ("grant_type", "authorization_code"),
            ("client_id", instance.client_id.as_str()),
            ("client_secret", instance.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ]);

    let response = ctx.transport.send(request).await?;
    debug!("Token request status: {}", response.status);

    match response.status {
        StatusCode::OK => parse_token(&response, ctx.clock),
        status => Err(Error::unexpected_status(status)),
    }
}

/// Renews the instance's token. A 401 becomes [`Error::ExpiredRefreshToken`]
/// so the caller can start over with a full grant.
pub async fn refresh_grant(
    transport: &dyn Transport,
    clock: &dyn Clock,
    instance: &InstanceRecord,
) -> Result<TokenRecord> {
    let refresh_token = instance
        .token
        .as_ref()
        .and_then(|t| t.refresh_token.clone())
        .ok_or(Error::ExpiredRefreshToken)?;

    // The token endpoint may have moved since the token was issued.
    let descriptor = discover(transport, &instance.url).await?;
    let token_endpoint = descriptor.token_endpoint_for(&instance.url);

    debug!("Refreshing auth token at {}", token_endpoint);
    let request = ApiRequest::post(&token_endpoint)
        .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
        .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_FORM)
        .form(&[
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("client_id", instance.client_id.as_str()),
            ("client_secret", instance.client_secret.as_str()),
        ]);

    let response = transport.send(request).await?;
    debug!("Refresh request status: {}", response.status);

    match response.status {
        StatusCode::OK => {
            let mut token = parse_token(&response, clock)?;
            if token.refresh_token.is_none() {
                token.refresh_token = Some(refresh_token);
            }
            Ok(token)
        }
        StatusCode::UNAUTHORIZED => Err(Error::ExpiredRefreshToken),
        status => Err(Error::unexpected_status(status)),
    }
}
