//! OAuth2 token lifecycle for marketplace instances.

pub mod acquirer;
pub mod browser;
pub mod capabilities;
pub mod flows;
pub mod token;

pub use acquirer::{TokenAcquirer, TokenDecision, TokenOverride, decide};
pub use browser::{BrowserDriver, SystemBrowser};
pub use capabilities::{CapabilityDescriptor, GrantFlow, select_flow};
pub use token::{Clock, FixedClock, SystemClock, TokenRecord};
