//! Micrart Core - Shared domain types.
//!
//! This crate provides the types used across all Micrart components:
//! - `gallery` - Public art gallery and blog
//! - `admin` - Administration panel for creating artworks and posts
//! - `backend` - Gateway to the hosted database, storage, and auth service
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no image decoding. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Entities, newtype IDs, slugs, ratings, and validation
//! - [`crop`] - Crop rectangle geometry and aspect ratio presets
//! - [`carousel`] - Review carousel index arithmetic
//! - [`progress`] - Simulated upload progress
//! - [`display`] - Display formatting shared by templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carousel;
pub mod crop;
pub mod display;
pub mod progress;
pub mod types;

pub use types::*;
