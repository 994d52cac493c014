use log::*;
use sup_common::Secret;

use crate::error::ConfigError;

pub const DEFAULT_API_VERSION: &str = "2025-07";

/// Credentials and API coordinates for one store. Loaded once at startup and passed into each
/// component at construction; nothing in this crate reads the environment after this point.
#[derive(Debug, Clone, Default)]
pub struct UploaderConfig {
    /// The store domain, e.g. "my-shop.myshopify.com". A full `http(s)://` URL is also accepted.
    pub shop: String,
    pub access_token: Secret<String>,
    pub api_version: String,
}

impl UploaderConfig {
    pub fn new(shop: &str, access_token: &str) -> Self {
        Self {
            shop: shop.to_string(),
            access_token: Secret::new(access_token.to_string()),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Loads the configuration from `SHOPIFY_STORE`, `ACCESS_TOKEN` and `API_VERSION`.
    ///
    /// A missing store or token is a hard error. The caller is expected to abort before making
    /// any network call. A missing `API_VERSION` falls back to [`DEFAULT_API_VERSION`].
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let shop = read_var("SHOPIFY_STORE")?;
        let access_token = Secret::new(read_var("ACCESS_TOKEN")?);
        let api_version = match std::env::var("API_VERSION") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                warn!("API_VERSION not set, using {DEFAULT_API_VERSION} as default");
                DEFAULT_API_VERSION.to_string()
            },
        };
        Ok(Self { shop, access_token, api_version })
    }
}

fn read_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Environment variables are process-global, so the missing/present cases run in one test to
    // keep them from interleaving with each other under the parallel test runner.
    #[test]
    fn loads_from_env_and_fails_fast_when_incomplete() {
        std::env::remove_var("SHOPIFY_STORE");
        std::env::remove_var("ACCESS_TOKEN");
        std::env::remove_var("API_VERSION");
        assert!(matches!(UploaderConfig::try_from_env(), Err(ConfigError::MissingVar("SHOPIFY_STORE"))));

        std::env::set_var("SHOPIFY_STORE", "example.myshopify.com");
        assert!(matches!(UploaderConfig::try_from_env(), Err(ConfigError::MissingVar("ACCESS_TOKEN"))));

        std::env::set_var("ACCESS_TOKEN", "shpat_0000");
        let config = UploaderConfig::try_from_env().unwrap();
        assert_eq!(config.shop, "example.myshopify.com");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);

        std::env::set_var("API_VERSION", "2024-10");
        let config = UploaderConfig::try_from_env().unwrap();
        assert_eq!(config.api_version, "2024-10");

        std::env::remove_var("SHOPIFY_STORE");
        std::env::remove_var("ACCESS_TOKEN");
        std::env::remove_var("API_VERSION");
    }
}
