//! Tokens and sessions issued by the auth service.
//!
//! Tokens are plain strings so they can be serialized into the admin
//! session store. `Debug` never prints them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use micrart_core::AdminUser;

/// Refresh this long before the access token actually expires.
pub const EXPIRY_LEEWAY: Duration = Duration::seconds(30);

macro_rules! define_token {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// The raw token, for request headers only.
            #[must_use]
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

define_token!(AccessToken);
define_token!(RefreshToken);

/// A signed-in admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub expires_at: DateTime<Utc>,
    pub user: AdminUser,
}

impl AuthSession {
    /// Whether the access token should be refreshed before use.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + EXPIRY_LEEWAY >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: AccessToken::new("header.payload.signature"),
            refresh_token: RefreshToken::new("refresh-1"),
            expires_at,
            user: AdminUser {
                id: Uuid::nil(),
                email: Some("admin@micrart.test".to_string()),
            },
        }
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug_output = format!("{:?}", session(Utc::now()));
        assert!(debug_output.contains("AccessToken([REDACTED])"));
        assert!(!debug_output.contains("header.payload.signature"));
        assert!(!debug_output.contains("refresh-1"));
    }

    #[test]
    fn test_needs_refresh_within_leeway() {
        let now = Utc::now();
        assert!(session(now + Duration::seconds(10)).needs_refresh(now));
        assert!(session(now - Duration::seconds(1)).needs_refresh(now));
        assert!(!session(now + Duration::minutes(10)).needs_refresh(now));
    }
}
