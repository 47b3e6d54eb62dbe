//! End-to-end tests for Micrart.
//!
//! Both servers are booted in-process on ephemeral ports over one shared
//! [`MemoryBackend`], so the suite needs no Supabase project:
//!
//! ```bash
//! cargo test -p micrart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `admin_auth` - session guard, login, logout, token refresh, SSE streams
//! - `admin_content` - crop-and-upload, artwork and post creation
//! - `gallery_reviews` - review validation and the carousel
//! - `gallery_blog` - search and not-found pages

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use micrart_backend::{Backend, MemoryBackend, SupabaseConfig};
use reqwest::Client;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use tokio::net::TcpListener;
use url::Url;

pub const ADMIN_EMAIL: &str = "curator@micrart.test";
pub const ADMIN_PASSWORD: &str = "pencil-tip";

/// Placeholder project settings. The memory backend never dials out.
#[must_use]
pub fn supabase_config() -> SupabaseConfig {
    SupabaseConfig {
        url: Url::parse("https://micrart.supabase.invalid").unwrap_or_else(|e| {
            unreachable!("static url: {e}")
        }),
        anon_key: SecretString::from("anon-key"),
        schema: SupabaseConfig::DEFAULT_SCHEMA.to_string(),
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> String {
    #[allow(clippy::expect_used)]
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind ephemeral port");
    #[allow(clippy::expect_used)]
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        let service = router.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, service).await {
            tracing::error!("test server stopped: {e}");
        }
    });

    format!("http://{addr}")
}

/// A running gallery and admin pair sharing one store.
pub struct TestApps {
    pub memory: MemoryBackend,
    pub gallery_url: String,
    pub admin_url: String,
}

impl TestApps {
    /// Boot both servers with one registered admin account.
    pub async fn start() -> Self {
        let memory = MemoryBackend::new();
        memory.add_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let backend = Backend::in_memory(&memory);

        let gallery_state =
            micrart_gallery::state::AppState::new(gallery_config(), backend.clone());
        let gallery_url = serve(micrart_gallery::app(gallery_state)).await;

        let admin_state = micrart_admin::state::AppState::new(
            micrart_admin::config::AdminConfig::local(supabase_config()),
            backend,
        );
        let admin_url = serve(micrart_admin::app(admin_state)).await;

        Self {
            memory,
            gallery_url,
            admin_url,
        }
    }

    #[must_use]
    pub fn gallery(&self, path: &str) -> String {
        format!("{}{path}", self.gallery_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Client that keeps cookies and reports redirects instead of following them.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client() -> Client {
        #[allow(clippy::expect_used)]
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .expect("build HTTP client")
    }

    /// A client already signed in to the admin.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect to the dashboard.
    pub async fn admin_client(&self) -> Client {
        let client = Self::client();
        #[allow(clippy::expect_used)]
        let response = client
            .post(self.admin("/auth/login"))
            .form(&[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)])
            .send()
            .await
            .expect("login request");
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/dashboard"));
        client
    }
}

fn gallery_config() -> micrart_gallery::config::GalleryConfig {
    micrart_gallery::config::GalleryConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        cache_ttl: Duration::from_secs(
            micrart_gallery::config::GalleryConfig::DEFAULT_CACHE_TTL_SECS,
        ),
        supabase: supabase_config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Reads named events off a server-sent event response.
pub struct EventReader {
    response: reqwest::Response,
    buffer: String,
}

impl EventReader {
    /// Wait for a stream to open, returning a reader over its events.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the stream does not answer 200.
    pub async fn open(client: &Client, url: String) -> Self {
        #[allow(clippy::expect_used)]
        let response = client.get(url).send().await.expect("open event stream");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        Self {
            response,
            buffer: String::new(),
        }
    }

    /// The `data` of the next event called `name`, skipping others.
    ///
    /// Returns `None` if the stream ends or nothing arrives within five
    /// seconds.
    pub async fn next(&mut self, name: &str) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.read(name))
            .await
            .ok()
            .flatten()
    }

    async fn read(&mut self, name: &str) -> Option<String> {
        loop {
            while let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = None;
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = Some(value.trim().to_string());
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim());
                    }
                }
                if event.as_deref() == Some(name) {
                    return Some(data);
                }
            }
            let chunk = self.response.chunk().await.ok()??;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

/// A solid-colour PNG of the given size.
///
/// # Panics
///
/// Panics if PNG encoding fails.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 120, 60]));
    let mut bytes = Vec::new();
    #[allow(clippy::expect_used)]
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}
