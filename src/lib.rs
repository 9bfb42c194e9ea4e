pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod ui;
pub mod upload;

pub use error::{Error, Result};
