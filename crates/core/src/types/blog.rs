//! Blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::id::BlogPostId;
use crate::types::slug::Slug;
use crate::types::validation::{ValidationError, check_length, non_blank};

/// A rich-text article as stored in the `blog_posts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    /// Rich HTML produced by the admin editor.
    pub content: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub slug: Slug,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `tags` is a nullable array column.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert payload for a new blog post.
///
/// The slug is derived from the title here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBlogPost {
    title: String,
    content: String,
    cover_image_url: String,
    slug: Slug,
    tags: Vec<String>,
    published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

impl NewBlogPost {
    /// Maximum title length in characters.
    pub const MAX_TITLE: usize = 200;
    /// Maximum number of tags.
    pub const MAX_TAGS: usize = 10;

    /// Validate the blog form and derive the slug.
    ///
    /// `tags` is the raw comma-separated input; blanks and duplicates are
    /// dropped. Posts created here are published immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BlogIncomplete`] if the title, content, or
    /// cover image is missing, and [`ValidationError::UnsluggableTitle`] if
    /// the title yields an empty slug.
    pub fn new(
        title: &str,
        content: &str,
        cover_image_url: Option<&str>,
        tags: &str,
        author: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (Some(title), Some(content), Some(cover_image_url)) = (
            non_blank(title),
            non_blank(content),
            cover_image_url.and_then(non_blank),
        ) else {
            return Err(ValidationError::BlogIncomplete);
        };
        check_length("Title", title, Self::MAX_TITLE)?;

        let slug = Slug::from_title(title);
        if slug.is_empty() {
            return Err(ValidationError::UnsluggableTitle);
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            cover_image_url: cover_image_url.to_string(),
            slug,
            tags: parse_tags(tags, Self::MAX_TAGS),
            published: true,
            author: author.and_then(non_blank).map(String::from),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn slug(&self) -> &Slug {
        &self.slug
    }

    #[must_use]
    pub fn cover_image_url(&self) -> &str {
        &self.cover_image_url
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

fn parse_tags(raw: &str, max: usize) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').filter_map(non_blank) {
        let tag = tag.trim_start_matches('#').to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.truncate(max);
    tags
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const COVER: &str = "https://cdn.test/storage/v1/object/public/blog-images/blog-1-a.jpg";

    #[test]
    fn test_requires_title_content_and_cover() {
        assert_eq!(
            NewBlogPost::new("Title", "<p>x</p>", None, "", None),
            Err(ValidationError::BlogIncomplete)
        );
        assert_eq!(
            NewBlogPost::new("Title", "   ", Some(COVER), "", None),
            Err(ValidationError::BlogIncomplete)
        );
        assert_eq!(
            NewBlogPost::new("", "<p>x</p>", Some(COVER), "", None),
            Err(ValidationError::BlogIncomplete)
        );
    }

    #[test]
    fn test_slug_derived_from_title() {
        let post = NewBlogPost::new("My Carving!", "<p>x</p>", Some(COVER), "", None).unwrap();
        assert_eq!(post.slug().as_str(), "my-carving");
    }

    #[test]
    fn test_rejects_title_without_slug_characters() {
        assert_eq!(
            NewBlogPost::new("???", "<p>x</p>", Some(COVER), "", None),
            Err(ValidationError::UnsluggableTitle)
        );
    }

    #[test]
    fn test_tags_are_normalized() {
        let post = NewBlogPost::new(
            "Tools",
            "<p>x</p>",
            Some(COVER),
            "#Graphite, chalk, , graphite",
            None,
        )
        .unwrap();
        assert_eq!(post.tags(), ["graphite", "chalk"]);
    }

    #[test]
    fn test_insert_payload_is_published() {
        let post = NewBlogPost::new("Tools", "<p>x</p>", Some(COVER), "", Some("admin@test"))
            .unwrap();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["published"], true);
        assert_eq!(json["slug"], "tools");
        assert_eq!(json["author"], "admin@test");
        assert_eq!(json["cover_image_url"], COVER);
    }

    #[test]
    fn test_row_with_null_tags() {
        let row = serde_json::json!({
            "id": "6f1c1b2e-3f43-4d7e-9f0e-8a4c2a1b9d10",
            "title": "Tools",
            "content": "<p>x</p>",
            "slug": "tools",
            "tags": null,
            "published": true,
            "created_at": "2025-03-01T10:00:00Z",
        });
        let post: BlogPost = serde_json::from_value(row).unwrap();
        assert!(post.tags.is_empty());
        assert!(post.cover_image_url.is_none());
    }
}
