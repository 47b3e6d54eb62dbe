//! Typed access to the content tables.
//!
//! ## Tables (schema `portfolio`)
//!
//! - `artworks` - gallery entries, inserted by admins
//! - `blog_posts` - articles, inserted by admins, read when `published`
//! - `reviews` - visitor reviews, inserted anonymously
//!
//! Repositories borrow the [`Database`](crate::Database) and decode rows
//! into `micrart_core` types.

mod artworks;
mod blog_posts;
mod reviews;

pub use artworks::ArtworkRepository;
pub use blog_posts::BlogPostRepository;
pub use reviews::ReviewRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BackendError;

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, BackendError> {
    rows.into_iter()
        .next()
        .map(serde_json::from_value)
        .transpose()
        .map_err(BackendError::from)
}
