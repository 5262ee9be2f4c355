//! Environment configuration for the backend endpoint and credentials.
//!
//! Nothing else in the crate is environment-driven; these values only feed
//! the hosted-platform client.

use std::env;

use tracing::{info, warn};

pub const ENV_BACKEND_URL: &str = "LINKDOCK_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "LINKDOCK_BACKEND_KEY";
pub const ENV_SITE_URL: &str = "LINKDOCK_SITE_URL";

const DEFAULT_SITE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted platform.
    pub base_url: String,
    /// Anonymous API key sent with every request.
    pub anon_key: String,
    /// Origin used when building the sign-in redirect in headless contexts.
    pub site_url: String,
}

impl BackendConfig {
    /// Loads from the environment. `None` when no backend URL is
    /// configured — callers fall back to the in-process stand-in.
    pub fn from_env() -> Option<Self> {
        let base_url = match env::var(ENV_BACKEND_URL) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                info!("{} not set, running against the local stand-in", ENV_BACKEND_URL);
                return None;
            }
        };
        let anon_key = env::var(ENV_BACKEND_KEY).unwrap_or_else(|_| {
            warn!("{} not set, requests will carry no key", ENV_BACKEND_KEY);
            String::new()
        });
        let site_url = env::var(ENV_SITE_URL).unwrap_or_else(|_| {
            info!("{} not set, using default: {}", ENV_SITE_URL, DEFAULT_SITE_URL);
            DEFAULT_SITE_URL.to_string()
        });
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            site_url: site_url.trim_end_matches('/').to_string(),
        })
    }
}
