//! Blog search and not-found pages on the public gallery.

#![allow(clippy::unwrap_used)]

use micrart_backend::Table;
use micrart_integration_tests::TestApps;
use reqwest::StatusCode;
use serde_json::json;

async fn seed_posts(apps: &TestApps) {
    for (title, slug, published) in [
        ("Chalk Tower", "chalk-tower", true),
        ("Pencil Tip Alphabet", "pencil-tip-alphabet", true),
        ("Tower Draft", "tower-draft", false),
    ] {
        apps.memory
            .seed(
                Table::BlogPosts,
                json!({
                    "title": title,
                    "content": format!("<p>{title}</p>"),
                    "slug": slug,
                    "published": published,
                }),
            )
            .await;
    }
}

async fn get_text(url: String) -> (StatusCode, String) {
    let response = TestApps::client().get(url).send().await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_search_matches_titles_case_insensitively() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    let (status, body) = get_text(apps.gallery("/blog/search?q=TOWER")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Chalk Tower"));
    assert!(!body.contains("Pencil Tip Alphabet"));
    assert!(!body.contains("Tower Draft"));
}

#[tokio::test]
async fn test_blank_search_lists_every_published_post() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    let (_, body) = get_text(apps.gallery("/blog/search?q=%20%20")).await;
    assert!(body.contains("Chalk Tower"));
    assert!(body.contains("Pencil Tip Alphabet"));
    assert!(!body.contains("Tower Draft"));
}

#[tokio::test]
async fn test_search_without_matches_says_so() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    let (_, body) = get_text(apps.gallery("/blog/search?q=marble")).await;
    assert!(body.contains("No posts match"));
}

#[tokio::test]
async fn test_listing_prefilters_from_query() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    let (status, body) = get_text(apps.gallery("/blog?q=pencil")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Pencil Tip Alphabet"));
    assert!(!body.contains("Chalk Tower"));
}

#[tokio::test]
async fn test_unknown_pages_are_not_found() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    for path in [
        "/blog/no-such-post",
        "/blog/tower-draft",
        "/artwork/999",
        "/artwork/not-a-number",
        "/nowhere",
    ] {
        let (status, _) = get_text(apps.gallery(path)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    }

    let (status, _) = get_text(apps.admin("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_published_post_page_renders() {
    let apps = TestApps::start().await;
    seed_posts(&apps).await;

    let (status, body) = get_text(apps.gallery("/blog/chalk-tower")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("application/ld+json"));
}
