use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;

use super::constants::{self, headers};
use super::transport::{ApiRequest, Transport};
use crate::auth::TokenAcquirer;
use crate::config::InstanceRecord;
use crate::descriptor::ComponentIdentity;
use crate::error::{Error, Result};

/// Visibility requested for an upload, as received from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PublicFlag {
    #[default]
    Unset,
    Set(bool),
    /// Anything that was not a boolean; rejected by [`upload`](ComponentOperations::upload).
    Invalid(String),
}

impl PublicFlag {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "true" => PublicFlag::Set(true),
            "false" => PublicFlag::Set(false),
            other => PublicFlag::Invalid(other.to_string()),
        }
    }

    pub fn validate(&self) -> Result<Option<bool>> {
        match self {
            PublicFlag::Unset => Ok(None),
            PublicFlag::Set(value) => Ok(Some(*value)),
            PublicFlag::Invalid(raw) => Err(Error::validation(format!(
                "isPublic parameter must be a boolean (got {})",
                raw
            ))),
        }
    }
}

impl From<Option<bool>> for PublicFlag {
    fn from(value: Option<bool>) -> Self {
        value.map_or(PublicFlag::Unset, PublicFlag::Set)
    }
}

/// Remote operations on Mashable Application Components.
#[async_trait]
pub trait ComponentOperations: Send + Sync {
    async fn exists(&self, instance: &str, component: &ComponentIdentity) -> Result<bool>;

    /// Removes the component together with everything depending on it.
    async fn delete(&self, instance: &str, component: &ComponentIdentity) -> Result<()>;

    async fn upload(&self, instance: &str, file: &Path, public: &PublicFlag) -> Result<()>;
}

/// Marketplace API client; every call acquires a token first.
pub struct MarketplaceClient {
    acquirer: Arc<TokenAcquirer>,
    transport: Arc<dyn Transport>,
}

impl MarketplaceClient {
    pub fn new(acquirer: Arc<TokenAcquirer>, transport: Arc<dyn Transport>) -> Self {
        Self {
            acquirer,
            transport,
        }
    }

    pub fn acquirer(&self) -> &TokenAcquirer {
        &self.acquirer
    }

    async fn authorized(&self, instance_name: &str) -> Result<(InstanceRecord, String)> {
        let instance = self.acquirer.acquire(instance_name).await?;
        let token = instance
            .access_token()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::UnexpectedServerResponse("server issued no access token".to_string())
            })?;
        Ok((instance, token))
    }
}

#[async_trait]
impl ComponentOperations for MarketplaceClient {
    async fn exists(&self, instance: &str, component: &ComponentIdentity) -> Result<bool> {
        let (record, token) = self.authorized(instance).await?;
        let url = constants::resource_endpoint(
            &record.url,
            &component.vendor,
            &component.name,
            &component.version,
        );

        debug!("Checking {} at {}", component, url);
        let response = self
            .transport
            .send(
                ApiRequest::get(url)
                    .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
                    .bearer(&token),
            )
            .await?;

        match response.status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::unexpected_status(status)),
        }
    }

    async fn delete(&self, instance: &str, component: &ComponentIdentity) -> Result<()> {
        let (record, token) = self.authorized(instance).await?;
        let url = constants::resource_delete_endpoint(
            &record.url,
            &component.vendor,
            &component.name,
            &component.version,
        );

        info!("Deleting {} from {}", component, instance);
        let response = self
            .transport
            .send(
                ApiRequest::delete(url)
                    .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
                    .bearer(&token),
            )
            .await?;

        match response.status {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(Error::unexpected_status(status)),
        }
    }

    async fn upload(&self, instance: &str, file: &Path, public: &PublicFlag) -> Result<()> {
        let public = public.validate()?;

        let metadata = tokio::fs::metadata(file)
            .await
            .map_err(|e| Error::validation(format!("Cannot read {}: {}", file.display(), e)))?;
        if !metadata.is_file() {
            return Err(Error::validation(format!("{} is not a file", file.display())));
        }

        let (record, token) = self.authorized(instance).await?;
        let url = constants::resources_endpoint(&record.url, public);

        info!("Uploading {} ({} bytes) to {}", file.display(), metadata.len(), url);
        let response = self
            .transport
            .send(
                ApiRequest::post(url)
                    .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_OCTET_STREAM)
                    .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON)
                    .bearer(&token)
                    .file(file.to_path_buf(), metadata.len()),
            )
            .await?;

        match response.status {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(Error::unexpected_status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_flag_parse() {
        assert_eq!(PublicFlag::parse("true"), PublicFlag::Set(true));
        assert_eq!(PublicFlag::parse(" false "), PublicFlag::Set(false));
        assert_eq!(PublicFlag::parse("yes"), PublicFlag::Invalid("yes".to_string()));
    }

    #[test]
    fn test_public_flag_validate() {
        assert_eq!(PublicFlag::Unset.validate().unwrap(), None);
        assert_eq!(PublicFlag::from(Some(true)).validate().unwrap(), Some(true));
        let err = PublicFlag::Invalid("1".to_string()).validate().unwrap_err();
        assert!(err.to_string().contains("must be a boolean"));
    }
}
