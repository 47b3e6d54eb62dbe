//! Review submission and the review carousel on the public gallery.

#![allow(clippy::unwrap_used)]

use micrart_backend::Table;
use micrart_integration_tests::TestApps;
use reqwest::StatusCode;
use serde_json::json;

async fn submit(apps: &TestApps, rating: &str) -> reqwest::Response {
    TestApps::client()
        .post(apps.gallery("/reviews"))
        .form(&[
            ("user_name", "Ada"),
            ("comment", "Unbelievably small."),
            ("rating", rating),
        ])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_zero_rating_is_rejected_without_insert() {
    let apps = TestApps::start().await;

    let response = submit(&apps, "0").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("HX-Trigger").is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("Please fill all fields and select a rating."));
    // Typed input is kept.
    assert!(body.contains("Unbelievably small."));

    assert!(apps.memory.rows(Table::Reviews).await.is_empty());
}

#[tokio::test]
async fn test_valid_review_is_stored_and_announced() {
    let apps = TestApps::start().await;

    let response = submit(&apps, "4.5").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("HX-Trigger").unwrap(),
        "reviewAdded"
    );

    let rows = apps.memory.rows(Table::Reviews).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_name"], "Ada");
    assert_eq!(rows[0]["rating"], 4.5);

    let body = TestApps::client()
        .get(apps.gallery("/reviews/carousel"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Unbelievably small."));
}

#[tokio::test]
async fn test_fractional_rating_is_stored_exactly() {
    let apps = TestApps::start().await;

    let page = TestApps::client()
        .get(apps.gallery("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"name="rating" type="range" min="0" max="5" step="0.1""#));

    let response = submit(&apps, "3.7").await;
    assert_eq!(
        response.headers().get("HX-Trigger").unwrap(),
        "reviewAdded"
    );

    let rows = apps.memory.rows(Table::Reviews).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["rating"], 3.7);

    let body = TestApps::client()
        .get(apps.gallery("/reviews/carousel"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Rated 3.7 out of 5"));
    assert!(body.contains("fill-70"));
}

#[tokio::test]
async fn test_carousel_wraps_past_last_review() {
    let apps = TestApps::start().await;
    for (name, day) in [("Ada", 1), ("Grace", 2), ("Linus", 3)] {
        apps.memory
            .seed(
                Table::Reviews,
                json!({
                    "user_name": name,
                    "comment": format!("Review by {name}"),
                    "rating": 5,
                    "created_at": format!("2025-03-0{day}T12:00:00Z"),
                }),
            )
            .await;
    }
    let client = TestApps::client();
    let fetch = |index: usize| {
        let client = client.clone();
        let url = apps.gallery(&format!("/reviews/carousel?index={index}"));
        async move { client.get(url).send().await.unwrap().text().await.unwrap() }
    };

    let first = fetch(0).await;
    assert!(first.contains("1 / 3"));
    let wrapped = fetch(3).await;
    assert_eq!(wrapped, first);

    let last = fetch(2).await;
    assert!(last.contains("3 / 3"));
    assert!(last.contains("index=0"));
}

#[tokio::test]
async fn test_empty_carousel_invites_first_review() {
    let apps = TestApps::start().await;

    let body = TestApps::client()
        .get(apps.gallery("/reviews/carousel?index=5"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("No reviews yet."));
}
