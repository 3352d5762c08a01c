//! Rasad: terminal admin dashboard and typed client for the Rasad
//! social-media monitoring backend.

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod feeds;
pub mod format;
pub mod router;
pub mod ui;

pub use api::ApiClient;
pub use auth::Session;
pub use config::Config;
pub use error::{RasadError, Result};
