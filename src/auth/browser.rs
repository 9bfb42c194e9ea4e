//! Browser side of the authorization-code flow.

use std::time::Duration;

use async_trait::async_trait;
use colored::*;
use log::{debug, warn};
use reqwest::Url;

use crate::error::{Error, Result};
use crate::ui::prompts::text_input;

/// Upper bound for a human to finish logging in.
pub const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Sends the user to `auth_url` and resolves with the first URL the
    /// browser reaches that matches `redirect_uri`.
    async fn drive_authorization(
        &self,
        auth_url: &str,
        redirect_uri: &str,
        timeout: Duration,
    ) -> Result<String>;
}

/// Same scheme, host, port and path; the query string is ignored.
pub fn matches_redirect(current_url: &str, redirect_uri: &str) -> bool {
    match (Url::parse(current_url), Url::parse(redirect_uri)) {
        (Ok(current), Ok(expected)) => {
            current.scheme() == expected.scheme()
                && current.host_str() == expected.host_str()
                && current.port_or_known_default() == expected.port_or_known_default()
                && current.path() == expected.path()
        }
        _ => false,
    }
}

/// Pulls the `code` parameter out of the final redirect.
pub fn extract_code(redirected_url: &str) -> Result<String> {
    let url = Url::parse(redirected_url).map_err(|e| {
        Error::UnexpectedServerResponse(format!("Invalid redirect url '{}': {}", redirected_url, e))
    })?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(Error::UnexpectedServerResponse(format!(
                    "Authorization was rejected: {}",
                    value
                )));
            }
            _ => {}
        }
    }

    code.filter(|c| !c.is_empty()).ok_or_else(|| {
        Error::UnexpectedServerResponse("Redirect did not carry an authorization code".to_string())
    })
}

/// Opens the system browser and asks the operator to paste back the url
/// the login ended on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

#[async_trait]
impl BrowserDriver for SystemBrowser {
    async fn drive_authorization(
        &self,
        auth_url: &str,
        redirect_uri: &str,
        timeout: Duration,
    ) -> Result<String> {
        debug!("Redirecting to: {}", auth_url);
        println!();
        println!("Log in to the marketplace in your browser:");
        println!("  {}", auth_url.cyan());
        if let Err(e) = open::that(auth_url) {
            warn!("Failed to open browser automatically: {}", e);
        }

        let redirect_uri = redirect_uri.to_string();
        let wait = tokio::task::spawn_blocking(move || -> Result<String> {
            loop {
                let pasted = text_input("Paste the address your browser was redirected to", None)?;
                let pasted = pasted.trim().to_string();
                if matches_redirect(&pasted, &redirect_uri) {
                    return Ok(pasted);
                }
                println!("{} expected an address starting with {}", "✗".red(), redirect_uri);
            }
        });

        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Error::validation(format!("Browser wait aborted: {}", e))),
            Err(_) => Err(Error::AuthorizationTimedOut),
        }
    }
}
