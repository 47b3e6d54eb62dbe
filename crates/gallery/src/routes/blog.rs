//! Blog listing, live search, and post pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use micrart_core::display::{excerpt, format_display_date, strip_html};
use micrart_core::{BlogPost, Slug};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

const CARD_EXCERPT_CHARS: usize = 160;

/// A post in the listing.
#[derive(Clone)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub cover_image_url: Option<String>,
    pub date: String,
    pub tags: Vec<String>,
}

impl From<&BlogPost> for PostCard {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.to_string(),
            title: post.title.clone(),
            excerpt: excerpt(&strip_html(&post.content), CARD_EXCERPT_CHARS),
            cover_image_url: post.cover_image_url.clone(),
            date: format_display_date(post.created_at),
            tags: post.tags.clone(),
        }
    }
}

/// Everything the post page shows.
#[derive(Clone)]
pub struct PostDetail {
    pub title: String,
    pub author: Option<String>,
    pub date: String,
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    /// Editor HTML, rendered unescaped.
    pub content: String,
}

impl From<&BlogPost> for PostDetail {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            author: post.author.clone(),
            date: format_display_date(post.created_at),
            tags: post.tags.clone(),
            cover_image_url: post.cover_image_url.clone(),
            content: post.content.clone(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub posts: Vec<PostCard>,
    pub query: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "blog/results.html")]
pub struct BlogResultsTemplate {
    pub posts: Vec<PostCard>,
    pub query: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogPostTemplate {
    pub nonce: String,
    pub post: PostDetail,
    /// `Article` structured data, already escaped for a script element.
    pub json_ld: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn find_posts(state: &AppState, query: &str) -> Result<Vec<PostCard>> {
    let search = (!query.trim().is_empty()).then_some(query);
    let posts = state.catalog().published_posts(search).await?;
    Ok(posts.iter().map(PostCard::from).collect())
}

/// Blog listing, optionally pre-filtered by `?q=`.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<BlogIndexTemplate> {
    let posts = find_posts(&state, &query.q).await?;
    Ok(BlogIndexTemplate {
        posts,
        query: query.q,
    })
}

/// Results list only, re-fetched on every keystroke of the search box.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<BlogResultsTemplate> {
    let posts = find_posts(&state, &query.q).await?;
    Ok(BlogResultsTemplate {
        posts,
        query: query.q,
    })
}

/// A published post. Unknown and unpublished slugs get the 404 page.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path(slug): Path<String>,
) -> Result<BlogPostTemplate> {
    let post = state
        .catalog()
        .post(&Slug::from_path(&slug))
        .await?
        .ok_or_else(|| AppError::NotFound("post".to_string()))?;

    let url = format!(
        "{}/blog/{}",
        state.config().base_url.trim_end_matches('/'),
        post.slug
    );

    Ok(BlogPostTemplate {
        nonce: nonce.0,
        json_ld: article_json_ld(&post, &url),
        post: PostDetail::from(post.as_ref()),
    })
}

/// Schema.org `Article` markup for a post.
///
/// `<` is escaped so the JSON can never close its script element.
fn article_json_ld(post: &BlogPost, url: &str) -> String {
    let mut article = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": post.title,
        "url": url,
        "keywords": post.tags.join(", "),
    });
    if let Some(author) = &post.author {
        article["author"] = serde_json::json!({ "@type": "Person", "name": author });
    }
    if let Some(created_at) = post.created_at {
        article["datePublished"] = serde_json::Value::String(created_at.to_rfc3339());
    }
    if let Some(cover) = &post.cover_image_url {
        article["image"] = serde_json::Value::String(cover.clone());
    }
    article.to_string().replace('<', "\\u003c")
}
