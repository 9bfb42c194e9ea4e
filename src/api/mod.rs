//! WireCloud marketplace API
//!
//! Endpoint builders, the HTTP transport seam and the component
//! operations (existence check, delete, upload).

pub mod client;
pub mod constants;
pub mod transport;

pub use client::{ComponentOperations, MarketplaceClient, PublicFlag};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, RequestBody, Transport};
