//! Session guard and login flow against a running admin server.

#![allow(clippy::unwrap_used)]

use chrono::TimeDelta;
use micrart_admin::routes::api::events::{COUNTS_EVENT, SIGNED_OUT_EVENT};
use micrart_integration_tests::{ADMIN_EMAIL, EventReader, TestApps, location};
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let apps = TestApps::start().await;
    let client = TestApps::client();

    for path in ["/dashboard", "/artworks/new", "/blogs/new"] {
        let response = client.get(apps.admin(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/auth/login"), "{path}");
    }
}

#[tokio::test]
async fn test_protected_api_answers_unauthorized() {
    let apps = TestApps::start().await;
    let client = TestApps::client();

    let response = client
        .get(apps.admin(&format!("/api/uploads/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let apps = TestApps::start().await;
    let client = TestApps::client();

    let response = client
        .post(apps.admin("/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", "not-the-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password."));

    let response = client.get(apps.admin("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_opens_dashboard_and_logout_closes_it() {
    let apps = TestApps::start().await;
    let client = apps.admin_client().await;

    let response = client.get(apps.admin("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("data-counts-stream"));

    let response = client.get(apps.admin("/auth/login")).send().await.unwrap();
    assert_eq!(location(&response), Some("/dashboard"));

    let response = client.post(apps.admin("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));

    let response = client.get(apps.admin("/dashboard")).send().await.unwrap();
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn test_sign_out_elsewhere_revokes_session() {
    let apps = TestApps::start().await;
    let first = apps.admin_client().await;
    let second = apps.admin_client().await;

    let response = second.post(apps.admin("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The watcher picks the sign-out event up asynchronously.
    let mut revoked = false;
    for _ in 0..50 {
        let response = first.get(apps.admin("/dashboard")).send().await.unwrap();
        if response.status() == StatusCode::SEE_OTHER {
            revoked = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(revoked, "session survived a sign-out of the same user");
}

#[tokio::test]
async fn test_expiring_token_refreshes_transparently() {
    let apps = TestApps::start().await;
    // Inside the refresh leeway from the moment they are issued.
    apps.memory.set_token_ttl(TimeDelta::seconds(10)).await;
    let client = apps.admin_client().await;

    // Refresh tokens are single use, so the second request only passes if
    // the first one stored the rotated pair.
    for _ in 0..2 {
        let response = client.get(apps.admin("/dashboard")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_failed_refresh_redirects_to_login() {
    let apps = TestApps::start().await;
    apps.memory.set_token_ttl(TimeDelta::seconds(10)).await;
    let client = apps.admin_client().await;
    apps.memory.expire_refresh_tokens().await;

    let response = client.get(apps.admin("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));

    let response = client
        .get(apps.admin("/api/session/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_stream_reports_sign_out_elsewhere() {
    let apps = TestApps::start().await;
    let page = apps.admin_client().await;
    let other = apps.admin_client().await;
    let mut events = EventReader::open(&page, apps.admin("/api/session/stream")).await;

    let response = other.post(apps.admin("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(events.next(SIGNED_OUT_EVENT).await.as_deref(), Some("{}"));
}

#[tokio::test]
async fn test_counts_stream_follows_inserts() {
    let apps = TestApps::start().await;
    let client = apps.admin_client().await;
    let mut events =
        EventReader::open(&client, apps.admin("/api/dashboard/counts/stream")).await;

    let initial: Value = serde_json::from_str(&events.next(COUNTS_EVENT).await.unwrap()).unwrap();
    assert_eq!(initial["artworks"], 0);

    let response = client
        .post(apps.admin("/artworks"))
        .form(&[
            ("title", "Rice Grain Portrait"),
            ("description", ""),
            ("image_url", "https://cdn.micrart.test/rice.jpg"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let updated: Value = serde_json::from_str(&events.next(COUNTS_EVENT).await.unwrap()).unwrap();
    assert_eq!(updated["artworks"], 1);
    assert_eq!(updated["blog_posts"], 0);
}
