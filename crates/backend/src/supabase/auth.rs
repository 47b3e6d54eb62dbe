//! GoTrue password auth.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::instrument;

use micrart_core::{AdminUser, Email};

use super::{Api, SupabaseClient, check};
use crate::auth::{AccessToken, AuthSession, RefreshToken};
use crate::error::BackendError;
use crate::events::AuthEvent;
use crate::gateway::AuthService;

/// Body of a successful `/auth/v1/token` call.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AdminUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in));
        AuthSession {
            access_token: AccessToken::new(self.access_token),
            refresh_token: RefreshToken::new(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, BackendError> {
        let url = self.url(
            "auth/v1/token",
            &[("grant_type".to_string(), grant_type.to_string())],
        )?;
        let request = self.inner.client.post(url).json(&body);
        let response = self.authorized(request, None).send().await?;
        let response = check(response, Api::Auth).await?;

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text)?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    #[instrument(skip(self, email, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let session = self
            .token_grant(
                "password",
                json!({ "email": email.as_str(), "password": password.expose_secret() }),
            )
            .await?;

        tracing::info!(user_id = %session.user.id, "admin signed in");
        self.publish_auth(AuthEvent::SignedIn {
            user_id: session.user.id,
            at: Utc::now(),
        });
        Ok(session)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<AuthSession, BackendError> {
        let session = self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": refresh_token.expose() }),
            )
            .await?;

        tracing::debug!(user_id = %session.user.id, "token refreshed");
        self.publish_auth(AuthEvent::TokenRefreshed {
            user_id: session.user.id,
            at: Utc::now(),
        });
        Ok(session)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user.id))]
    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        let url = self.url("auth/v1/logout", &[])?;
        let request = self.inner.client.post(url);
        let response = self
            .authorized(request, Some(&session.access_token))
            .send()
            .await?;
        let result = check(response, Api::Auth).await;

        // The local session is gone either way.
        self.publish_auth(AuthEvent::SignedOut {
            user_id: session.user.id,
            at: Utc::now(),
        });
        result.map(|_| ())
    }

    #[instrument(skip(self, access_token))]
    async fn get_user(&self, access_token: &AccessToken) -> Result<AdminUser, BackendError> {
        let url = self.url("auth/v1/user", &[])?;
        let request = self.inner.client.get(url);
        let response = self.authorized(request, Some(access_token)).send().await?;
        let response = check(response, Api::Auth).await?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.auth_events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_uses_expires_at() {
        let body = r#"{
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1735689600,
            "refresh_token": "r",
            "user": {"id": "6f1c1b2e-3f43-4d7e-9f0e-8a4c2a1b9d10", "email": "admin@micrart.test", "role": "authenticated"}
        }"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let session = token.into_session(Utc::now());
        assert_eq!(session.expires_at.timestamp(), 1_735_689_600);
        assert_eq!(session.user.email.as_deref(), Some("admin@micrart.test"));
        assert_eq!(session.access_token.expose(), "a");
    }

    #[test]
    fn test_token_response_falls_back_to_expires_in() {
        let body = r#"{
            "access_token": "a",
            "expires_in": 60,
            "refresh_token": "r",
            "user": {"id": "6f1c1b2e-3f43-4d7e-9f0e-8a4c2a1b9d10"}
        }"#;
        let now = Utc::now();
        let session = serde_json::from_str::<TokenResponse>(body)
            .unwrap()
            .into_session(now);
        assert_eq!(session.expires_at, now + Duration::seconds(60));
    }
}
