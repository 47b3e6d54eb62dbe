//! Gallery configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GALLERY_BASE_URL` - Public URL for the gallery
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - see `micrart_backend::config`
//!
//! ## Optional
//! - `GALLERY_HOST` - Bind address (default: 127.0.0.1)
//! - `GALLERY_PORT` - Listen port (default: 3000)
//! - `GALLERY_CACHE_TTL_SECS` - Listing cache lifetime (default: 60)
//! - `SUPABASE_SCHEMA` - Exposed schema (default: portfolio)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use micrart_backend::SupabaseConfig;
use micrart_backend::config::{
    ConfigError, get_optional_env, get_parsed_env_or, get_required_env, load_dotenv,
};

/// Gallery application configuration.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the gallery
    pub base_url: String,
    /// How long listing pages stay cached
    pub cache_ttl: Duration,
    /// Backend project settings
    pub supabase: SupabaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl GalleryConfig {
    /// Default listing cache lifetime in seconds.
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let cache_ttl_secs =
            get_parsed_env_or("GALLERY_CACHE_TTL_SECS", Self::DEFAULT_CACHE_TTL_SECS)?;

        Ok(Self {
            host: get_parsed_env_or("GALLERY_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: get_parsed_env_or("GALLERY_PORT", 3000)?,
            base_url: get_required_env("GALLERY_BASE_URL")?,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            supabase: SupabaseConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_env_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_parsed_env_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = GalleryConfig {
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            cache_ttl: Duration::from_secs(60),
            supabase: SupabaseConfig {
                url: Url::parse("https://abcd.supabase.co").unwrap(),
                anon_key: SecretString::from("key"),
                schema: SupabaseConfig::DEFAULT_SCHEMA.to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(!format!("{config:?}").contains("\"key\""));
    }
}
