use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::error::{AdminError, Result};

/// Create the default HTTP client for admin API requests
/// with connection pooling and timeouts
pub(crate) fn create_admin_client() -> Client {
    ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(Duration::from_secs(300)) // 5 minutes
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Configuration for the admin API client
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute base URL of the Passport server
    base_url: Url,
    /// Realm whose administration API is addressed
    realm: String,
}

impl Config {
    /// Create a new configuration.
    ///
    /// The base URL is parsed eagerly so a malformed URL fails here,
    /// before any request is built. A missing trailing slash on the base
    /// path is added so relative API paths join below it instead of
    /// replacing its last segment.
    pub fn new(base_url: &str, realm: impl Into<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AdminError::InvalidBaseUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Config {
            base_url,
            realm: realm.into(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the realm name
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Derive a configuration addressing another realm
    pub fn with_realm(&self, realm: impl Into<String>) -> Self {
        Config {
            base_url: self.base_url.clone(),
            realm: realm.into(),
        }
    }
}
