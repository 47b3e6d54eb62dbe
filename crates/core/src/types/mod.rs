//! Domain types for Micrart.
//!
//! Entities mirror the rows stored by the hosted backend. Insert payloads
//! (`New*`) can only be built through validating constructors.

pub mod admin;
pub mod artwork;
pub mod blog;
pub mod email;
pub mod id;
pub mod rating;
pub mod review;
pub mod slug;
pub mod validation;

pub use admin::AdminUser;
pub use artwork::{Artwork, NewArtwork};
pub use blog::{BlogPost, NewBlogPost};
pub use email::{Email, EmailError};
pub use id::*;
pub use rating::{Rating, RatingError};
pub use review::{NewReview, Review};
pub use slug::Slug;
pub use validation::ValidationError;
