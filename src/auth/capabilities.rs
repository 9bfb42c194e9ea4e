//! OAuth2 capability discovery and grant-flow selection.

use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::api::constants::{self, PASSWORD_GRANT_FLOW};
use crate::api::transport::{ApiRequest, Transport};
use crate::error::{Error, Result};

/// Content of `{url}/.well-known/oauth`. Fetched whenever a grant is
/// needed and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CapabilityDescriptor {
    #[serde(default)]
    pub flows: Vec<String>,
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default)]
    pub auth_endpoint: Option<String>,
    #[serde(default)]
    pub default_redirect_uri: Option<String>,
}

/// Grant flows able to obtain a token from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantFlow {
    Password,
    AuthorizationCode,
}

impl CapabilityDescriptor {
    pub fn supports(&self, flow: &str) -> bool {
        self.flows.iter().any(|f| f == flow)
    }

    pub fn token_endpoint_for(&self, instance_url: &str) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| constants::default_token_endpoint(instance_url))
    }

    pub fn auth_endpoint_for(&self, instance_url: &str) -> String {
        self.auth_endpoint
            .clone()
            .unwrap_or_else(|| constants::default_authorize_endpoint(instance_url))
    }
}

/// The password grant wins whenever the server advertises it.
pub fn select_flow(descriptor: &CapabilityDescriptor) -> GrantFlow {
    if descriptor.supports(PASSWORD_GRANT_FLOW) {
        GrantFlow::Password
    } else {
        GrantFlow::AuthorizationCode
    }
}

pub async fn discover(transport: &dyn Transport, instance_url: &str) -> Result<CapabilityDescriptor> {
    let url = constants::capability_endpoint(instance_url);
    debug!("Fetching OAuth2 capabilities from {}", url);

    let response = transport
        .send(ApiRequest::get(&url).header(constants::headers::ACCEPT, constants::headers::CONTENT_TYPE_JSON))
        .await
        .map_err(|e| {
            warn!("Capability request failed: {}", e);
            Error::CapabilityDiscoveryFailed(format!(
                "OAuth2 configuration couldn't be retrieved from {}",
                instance_url
            ))
        })?;

    if response.status != StatusCode::OK {
        return Err(Error::CapabilityDiscoveryFailed(format!(
            "{} answered with status {}",
            url,
            response.status.as_u16()
        )));
    }

    let descriptor: CapabilityDescriptor = serde_json::from_str(&response.body).map_err(|e| {
        Error::CapabilityDiscoveryFailed(format!("Invalid capability document: {}", e))
    })?;

    debug!("Server advertises flows: {:?}", descriptor.flows);
    Ok(descriptor)
}
