//! Endpoints and headers of the WireCloud marketplace API

/// OAuth2 capability document, relative to the instance url
pub const WELL_KNOWN_OAUTH_PATH: &str = ".well-known/oauth";

/// Collection endpoint used for uploads
pub const RESOURCES_PATH: &str = "api/resources";

/// Per-component endpoint prefix
pub const RESOURCE_PATH: &str = "api/resource";

/// Flow name advertised by servers supporting the password grant
pub const PASSWORD_GRANT_FLOW: &str = "Resource Owner Password Credentials Grant";

/// Fallbacks for capability documents that omit their endpoints
pub const DEFAULT_TOKEN_PATH: &str = "oauth2/token";
pub const DEFAULT_AUTHORIZE_PATH: &str = "oauth2/authorize";

/// Standard header values
pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";

    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
    pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Build the capability discovery URL
pub fn capability_endpoint(base_url: &str) -> String {
    join(base_url, WELL_KNOWN_OAUTH_PATH)
}

/// Build the upload URL, with the visibility flag only when it was given
pub fn resources_endpoint(base_url: &str, public: Option<bool>) -> String {
    let url = join(base_url, RESOURCES_PATH);
    match public {
        Some(public) => format!("{}?public={}", url, public),
        None => url,
    }
}

/// Build the URL of one component
pub fn resource_endpoint(base_url: &str, vendor: &str, name: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        join(base_url, RESOURCE_PATH),
        urlencoding::encode(vendor),
        urlencoding::encode(name),
        urlencoding::encode(version)
    )
}

/// Build the delete URL of one component, also removing dependents
pub fn resource_delete_endpoint(base_url: &str, vendor: &str, name: &str, version: &str) -> String {
    format!("{}?affected=true", resource_endpoint(base_url, vendor, name, version))
}

pub fn default_token_endpoint(base_url: &str) -> String {
    join(base_url, DEFAULT_TOKEN_PATH)
}

pub fn default_authorize_endpoint(base_url: &str) -> String {
    join(base_url, DEFAULT_AUTHORIZE_PATH)
}
