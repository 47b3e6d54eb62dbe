//! Supabase REST client.
//!
//! One `reqwest` client serves all three APIs of the project:
//!
//! - `/rest/v1` - PostgREST rows ([`Database`](crate::Database))
//! - `/storage/v1` - buckets ([`ObjectStorage`](crate::ObjectStorage))
//! - `/auth/v1` - GoTrue ([`AuthService`](crate::AuthService))
//!
//! Change and auth events are published for writes made through this
//! client. Writes made elsewhere (the Supabase dashboard, another process)
//! are not observed.

mod auth;
mod rest;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use url::Url;

use crate::auth::AccessToken;
use crate::config::SupabaseConfig;
use crate::error::BackendError;
use crate::events::{AuthEvent, CHANNEL_CAPACITY, TableChange};

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which API produced a response; decides how failures are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Rest,
    Storage,
    Auth,
}

/// Client for a Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    config: SupabaseConfig,
    changes: broadcast::Sender<TableChange>,
    auth_events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("micrart/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (auth_events, _) = broadcast::channel(CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                config: config.clone(),
                changes,
                auth_events,
            }),
        })
    }

    fn anon_key(&self) -> &SecretString {
        &self.inner.config.anon_key
    }

    /// `{url}/{path}?{pairs}` with proper encoding.
    fn url(&self, path: &str, pairs: &[(String, String)]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.inner.config.endpoint(path)).map_err(|e| {
            BackendError::Status {
                status: 0,
                message: format!("invalid endpoint {path}: {e}"),
            }
        })?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Attach `apikey` and a bearer token (the admin's, or the anon key).
    fn authorized(&self, builder: RequestBuilder, auth: Option<&AccessToken>) -> RequestBuilder {
        let bearer = auth.map_or_else(|| self.anon_key().expose_secret(), AccessToken::expose);
        builder
            .header("apikey", self.anon_key().expose_secret())
            .bearer_auth(bearer)
    }

    fn publish_change(&self, change: TableChange) {
        // No subscribers is not an error.
        let _ = self.inner.changes.send(change);
    }

    fn publish_auth(&self, event: AuthEvent) {
        let _ = self.inner.auth_events.send(event);
    }
}

/// Turn a non-success response into a `BackendError`.
async fn check(response: Response, api: Api) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::error!(
        status = %status,
        api = ?api,
        body = %body.chars().take(500).collect::<String>(),
        "Supabase returned non-success status"
    );

    Err(classify(status, api, message))
}

fn classify(status: StatusCode, api: Api, message: String) -> BackendError {
    match (status, api) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (StatusCode::BAD_REQUEST, Api::Auth) => BackendError::Auth(message),
        (StatusCode::NOT_FOUND, Api::Rest | Api::Auth) => BackendError::NotFound(message),
        (_, Api::Storage) => BackendError::Storage(message),
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a human-readable message out of a PostgREST, Storage, or GoTrue
/// error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(body), "Invalid login credentials");

        let postgrest = r#"{"code":"23505","message":"duplicate key value"}"#;
        assert_eq!(error_message(postgrest), "duplicate key value");

        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, Api::Auth, String::new()),
            BackendError::Auth(_)
        ));
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, Api::Storage, String::new()),
            BackendError::Storage(_)
        ));
        assert!(matches!(
            classify(StatusCode::CONFLICT, Api::Rest, String::new()),
            BackendError::Status { status: 409, .. }
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, Api::Rest, String::new()),
            BackendError::Auth(_)
        ));
    }
}
