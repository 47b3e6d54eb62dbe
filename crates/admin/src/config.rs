//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - see `micrart_backend::config`
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ARTWORK_BUCKET` - Storage bucket for artwork images (default: artworks)
//! - `BLOG_IMAGE_BUCKET` - Storage bucket for blog covers (default: blog-images)
//! - `ADMIN_MAX_UPLOAD_BYTES` - Largest accepted image upload (default: 10 MiB)
//! - `SUPABASE_SCHEMA` - Exposed schema (default: portfolio)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use micrart_backend::SupabaseConfig;
use micrart_backend::config::{
    ConfigError, get_env_or_default, get_optional_env, get_parsed_env_or, get_required_env,
    load_dotenv,
};
use secrecy::SecretString;

/// Default bucket for artwork images.
pub const DEFAULT_ARTWORK_BUCKET: &str = "artworks";
/// Default bucket for blog cover images.
pub const DEFAULT_BLOG_IMAGE_BUCKET: &str = "blog-images";
/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Backend project settings
    pub supabase: SupabaseConfig,
    /// Bucket receiving cropped artwork images
    pub artwork_bucket: String,
    /// Bucket receiving blog cover images
    pub blog_image_bucket: String,
    /// Largest accepted multipart upload body
    pub max_upload_bytes: usize,
    /// TLS configuration (optional, for HTTPS)
    pub tls: Option<TlsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if only one half of the TLS pair is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        Ok(Self {
            host: get_parsed_env_or("ADMIN_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: get_parsed_env_or("ADMIN_PORT", 3001)?,
            base_url: get_required_env("ADMIN_BASE_URL")?,
            supabase: SupabaseConfig::from_env()?,
            artwork_bucket: get_env_or_default("ARTWORK_BUCKET", DEFAULT_ARTWORK_BUCKET),
            blog_image_bucket: get_env_or_default("BLOG_IMAGE_BUCKET", DEFAULT_BLOG_IMAGE_BUCKET),
            max_upload_bytes: get_parsed_env_or("ADMIN_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            tls: TlsConfig::from_env()?,
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

    /// Whether the session cookie should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.tls.is_some() || self.base_url.starts_with("https://")
    }

    /// Configuration for tests and local demos against the in-memory backend.
    #[must_use]
    pub fn local(supabase: SupabaseConfig) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            supabase,
            artwork_bucket: DEFAULT_ARTWORK_BUCKET.to_string(),
            blog_image_bucket: DEFAULT_BLOG_IMAGE_BUCKET.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            tls: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}
